//! Compiled strategy model: expressions, conditions and definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::indicator::IndicatorOp;

/// Tolerance for `==` comparisons.
pub const EQUALITY_EPSILON: f64 = 1e-4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Expression {
    Value { value: f64 },
    Indicator { name: String, params: Vec<f64> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">=")]
    GreaterEqual,
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = "==")]
    Equal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

/// One comparison plus how it folds into the running result of its list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub left: Expression,
    pub operator: ComparisonOp,
    pub right: Expression,
    pub combinator: Combinator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDefinition {
    pub name: String,
    pub entry_conditions: Vec<Condition>,
    pub exit_conditions: Vec<Condition>,
}

impl Expression {
    pub fn value(value: f64) -> Self {
        Expression::Value { value }
    }

    pub fn indicator(name: &str, params: &[f64]) -> Self {
        Expression::Indicator {
            name: name.to_string(),
            params: params.to_vec(),
        }
    }
}

impl ComparisonOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Greater => ">",
            ComparisonOp::Less => "<",
            ComparisonOp::GreaterEqual => ">=",
            ComparisonOp::LessEqual => "<=",
            ComparisonOp::Equal => "==",
        }
    }

    pub fn apply(&self, left: f64, right: f64) -> bool {
        match self {
            ComparisonOp::Greater => left > right,
            ComparisonOp::Less => left < right,
            ComparisonOp::GreaterEqual => left >= right,
            ComparisonOp::LessEqual => left <= right,
            ComparisonOp::Equal => (left - right).abs() < EQUALITY_EPSILON,
        }
    }
}

impl Combinator {
    pub fn fold(&self, running: bool, next: bool) -> bool {
        match self {
            Combinator::And => running && next,
            Combinator::Or => running || next,
        }
    }
}

impl StrategyDefinition {
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.entry_conditions
            .iter()
            .chain(self.exit_conditions.iter())
    }

    /// Indicator references that do not resolve to a supported operation,
    /// rendered as written, deduplicated in first-seen order.
    pub fn unsupported_indicators(&self) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for condition in self.conditions() {
            for expr in [&condition.left, &condition.right] {
                if let Expression::Indicator { name, params } = expr {
                    if IndicatorOp::from_expression(name, params).is_err() {
                        let rendered = expr.to_string();
                        if !found.contains(&rendered) {
                            found.push(rendered);
                        }
                    }
                }
            }
        }
        found
    }

    /// Bars that must be visible before every supported indicator this
    /// definition references has a value.
    pub fn warmup_bars(&self) -> usize {
        self.conditions()
            .flat_map(|c| [&c.left, &c.right])
            .filter_map(|expr| match expr {
                Expression::Indicator { name, params } => {
                    IndicatorOp::from_expression(name, params).ok()
                }
                Expression::Value { .. } => None,
            })
            .map(|(op, _)| op.lookback() + 1)
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Value { value } => write!(f, "{}", value),
            Expression::Indicator { name, params } => {
                let joined = params
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "{}({})", name, joined)
            }
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::And => write!(f, "AND"),
            Combinator::Or => write!(f, "OR"),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.combinator,
            self.left,
            self.operator.symbol(),
            self.right
        )
    }
}

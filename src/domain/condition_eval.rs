//! Condition evaluation against a no-lookahead history.
//!
//! Any operand that cannot be resolved (indicator still warming up, unknown
//! indicator name, non-finite literal) makes its condition false.

use tracing::debug;

use crate::domain::condition::{Condition, Expression};
use crate::domain::history::History;
use crate::domain::indicator::IndicatorOp;
use crate::domain::indicator_adapter::IndicatorAdapter;

/// Resolve an expression at the history's current bar.
pub fn resolve(expr: &Expression, history: &History<'_>, adapter: &IndicatorAdapter) -> Option<f64> {
    match expr {
        Expression::Value { value } => Some(*value).filter(|v| v.is_finite()),
        Expression::Indicator { name, params } => {
            let resolved = IndicatorOp::from_expression(name, params)
                .and_then(|(op, field)| history.indicator(adapter, &op, field, 0));
            match resolved {
                Ok(value) => value.filter(|v| v.is_finite()),
                Err(e) => {
                    debug!(expression = %expr, error = %e, "indicator resolves to undefined");
                    None
                }
            }
        }
    }
}

pub fn evaluate_condition(
    condition: &Condition,
    history: &History<'_>,
    adapter: &IndicatorAdapter,
) -> bool {
    let Some(left) = resolve(&condition.left, history, adapter) else {
        return false;
    };
    let Some(right) = resolve(&condition.right, history, adapter) else {
        return false;
    };
    condition.operator.apply(left, right)
}

/// Seed with the first condition, then fold each later one with its own
/// combinator, strictly left to right. An empty list is false.
pub fn evaluate_conditions(
    conditions: &[Condition],
    history: &History<'_>,
    adapter: &IndicatorAdapter,
) -> bool {
    let Some((first, rest)) = conditions.split_first() else {
        return false;
    };
    rest.iter().fold(evaluate_condition(first, history, adapter), |running, c| {
        c.combinator
            .fold(running, evaluate_condition(c, history, adapter))
    })
}

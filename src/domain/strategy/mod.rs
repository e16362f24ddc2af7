//! Strategy evaluation contract and DSL-compiled strategies.

pub mod builtin;
pub mod registry;

use tracing::warn;

use crate::domain::condition::StrategyDefinition;
use crate::domain::condition_eval::evaluate_conditions;
use crate::domain::dsl_parser;
use crate::domain::error::TradesimError;
use crate::domain::history::History;
use crate::domain::indicator_adapter::IndicatorAdapter;
use crate::domain::signal::Signal;

/// Produces one signal per bar from the history visible at that bar.
pub trait StrategyEvaluator: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, history: &History<'_>) -> Signal;
}

/// A strategy compiled from a script.
#[derive(Debug, Clone)]
pub struct DslStrategy {
    definition: StrategyDefinition,
    adapter: IndicatorAdapter,
}

impl DslStrategy {
    pub fn new(definition: StrategyDefinition, adapter: IndicatorAdapter) -> Self {
        for reference in definition.unsupported_indicators() {
            warn!(
                strategy = %definition.name,
                indicator = %reference,
                "unsupported indicator; conditions using it will never hold"
            );
        }
        Self {
            definition,
            adapter,
        }
    }

    /// Compile a script. With `strict`, unsupported indicator references fail
    /// compilation instead of resolving to undefined.
    pub fn compile(
        script: &str,
        adapter: IndicatorAdapter,
        strict: bool,
    ) -> Result<Self, TradesimError> {
        let definition = dsl_parser::compile(script)?;
        if strict {
            if let Some(reference) = definition.unsupported_indicators().into_iter().next() {
                return Err(TradesimError::UnsupportedIndicator {
                    name: reference,
                    reason: format!("referenced by strategy '{}'", definition.name),
                });
            }
        }
        Ok(Self::new(definition, adapter))
    }

    pub fn definition(&self) -> &StrategyDefinition {
        &self.definition
    }
}

impl StrategyEvaluator for DslStrategy {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn evaluate(&self, history: &History<'_>) -> Signal {
        if evaluate_conditions(&self.definition.entry_conditions, history, &self.adapter) {
            Signal::buy(1.0)
        } else if evaluate_conditions(&self.definition.exit_conditions, history, &self.adapter) {
            Signal::sell(1.0)
        } else {
            Signal::hold()
        }
    }
}

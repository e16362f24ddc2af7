//! Name lookup for built-in strategies.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::builtin::{
    CandlestickPatterns, ConsensusStrategy, EmaCrossover, MacdTrend, RsiMeanReversion,
};
use super::StrategyEvaluator;
use crate::domain::consensus::ConsensusConfig;
use crate::domain::error::TradesimError;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator_adapter::IndicatorAdapter;

pub struct StrategyRegistry {
    strategies: BTreeMap<String, Arc<dyn StrategyEvaluator>>,
}

impl StrategyRegistry {
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    /// Registry holding every built-in strategy at its fixed parameters. The
    /// consensus strategy uses `consensus`.
    pub fn with_builtins(adapter: IndicatorAdapter, consensus: ConsensusConfig) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(EmaCrossover::new(21, 55, adapter.clone())));
        registry.register(Arc::new(RsiMeanReversion::new(
            14,
            30.0,
            70.0,
            adapter.clone(),
        )));
        registry.register(Arc::new(MacdTrend::new(
            DEFAULT_FAST,
            DEFAULT_SLOW,
            DEFAULT_SIGNAL,
            adapter.clone(),
        )));
        registry.register(Arc::new(CandlestickPatterns::new(adapter.clone())));
        registry.register(Arc::new(ConsensusStrategy::new(consensus, adapter)));
        registry
    }

    /// Add a strategy under its own name, replacing any previous entry.
    pub fn register(&mut self, strategy: Arc<dyn StrategyEvaluator>) {
        self.strategies.insert(strategy.name().to_string(), strategy);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn StrategyEvaluator>, TradesimError> {
        self.strategies
            .get(name)
            .cloned()
            .ok_or_else(|| TradesimError::UnknownStrategy {
                name: name.to_string(),
            })
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }
}

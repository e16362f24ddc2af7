//! Independent backtest runs across symbols and strategies, in parallel.
//!
//! Each run owns its account and series cache; the only shared inputs are
//! the immutable candle histories and strategies.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use rayon::prelude::*;

use super::backtest::{BacktestEngine, BacktestResult};
use super::candle::Candle;
use super::error::TradesimError;
use super::strategy::StrategyEvaluator;
use crate::ports::data_port::PriceHistoryPort;

/// Candles for one symbol.
#[derive(Debug, Clone)]
pub struct SymbolHistory {
    pub symbol: String,
    pub candles: Vec<Candle>,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub symbol: String,
    pub strategy: String,
    pub result: Result<BacktestResult, TradesimError>,
}

/// Split a comma-separated symbol list, upper-casing and rejecting blanks and
/// duplicates.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, TradesimError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(TradesimError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "symbols".to_string(),
                reason: "empty symbol in list".to_string(),
            });
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(TradesimError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "symbols".to_string(),
                reason: format!("duplicate symbol: {symbol}"),
            });
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Fetch one symbol's candles, treating an empty history as an error.
pub fn fetch_history(
    port: &dyn PriceHistoryPort,
    symbol: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<SymbolHistory, TradesimError> {
    let candles = port.fetch_candles(symbol, start, end)?;
    if candles.is_empty() {
        return Err(TradesimError::NoData {
            symbol: symbol.to_string(),
        });
    }
    Ok(SymbolHistory {
        symbol: symbol.to_string(),
        candles,
    })
}

/// Run every strategy against every history. Outcomes come back in
/// history-major order regardless of scheduling.
pub fn run_batch(
    engine: &BacktestEngine,
    histories: &[SymbolHistory],
    strategies: &[Arc<dyn StrategyEvaluator>],
) -> Vec<BatchOutcome> {
    let jobs: Vec<(&SymbolHistory, &Arc<dyn StrategyEvaluator>)> = histories
        .iter()
        .flat_map(|h| strategies.iter().map(move |s| (h, s)))
        .collect();

    jobs.par_iter()
        .map(|(history, strategy)| BatchOutcome {
            symbol: history.symbol.clone(),
            strategy: strategy.name().to_string(),
            result: engine.run(strategy.as_ref(), &history.candles, &history.symbol),
        })
        .collect()
}

//! Long-only backtest engine.
//!
//! FLAT + BUY opens a position with all cash at the bar's close; LONG + SELL
//! liquidates it. Every other signal leaves the state alone. Bars before the
//! warm-up index are never shown to the strategy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::account::{Account, EntryResult, EquityPoint};
use super::candle::Candle;
use super::error::TradesimError;
use super::history::{History, SeriesCache};
use super::metrics::Metrics;
use super::position::{ClosedTrade, Position};
use super::signal::SignalKind;
use super::strategy::StrategyEvaluator;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_WARMUP: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub warmup: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            warmup: DEFAULT_WARMUP,
        }
    }
}

/// Cooperative cancellation, checked once per bar.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub strategy_name: String,
    pub symbol: String,
    pub total_return_percent: f64,
    pub win_rate: f64,
    pub max_drawdown_percent: f64,
    pub sharpe_ratio: f64,
    pub profit_factor: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub trades: Vec<ClosedTrade>,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub equity_curve: Vec<EquityPoint>,
    pub open_position: Option<Position>,
}

impl BacktestResult {
    pub fn from_account(strategy_name: &str, symbol: &str, account: Account) -> Self {
        let metrics = Metrics::compute(&account.trades, &account.equity_curve, account.initial_capital);
        let final_capital = account
            .equity_curve
            .last()
            .map_or(account.initial_capital, |p| p.equity);
        BacktestResult {
            strategy_name: strategy_name.to_string(),
            symbol: symbol.to_string(),
            total_return_percent: metrics.total_return_percent,
            win_rate: metrics.win_rate,
            max_drawdown_percent: metrics.max_drawdown_percent,
            sharpe_ratio: metrics.sharpe_ratio,
            profit_factor: metrics.profit_factor,
            total_trades: metrics.total_trades,
            winning_trades: metrics.winning_trades,
            losing_trades: metrics.losing_trades,
            trades: account.trades,
            initial_capital: account.initial_capital,
            final_capital,
            equity_curve: account.equity_curve,
            open_position: account.position,
        }
    }

    pub fn realized_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.pnl).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BacktestEngine {
    config: BacktestConfig,
    cancel: CancelFlag,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        Self {
            config,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Walk `candles` from the warm-up index, asking `strategy` for a signal at
    /// each bar with only that bar's history visible.
    pub fn run(
        &self,
        strategy: &dyn StrategyEvaluator,
        candles: &[Candle],
        symbol: &str,
    ) -> Result<BacktestResult, TradesimError> {
        let warmup = self.config.warmup;
        if candles.len() <= warmup {
            return Err(TradesimError::InsufficientData {
                bars: candles.len(),
                minimum: warmup,
            });
        }

        info!(
            strategy = strategy.name(),
            symbol,
            bars = candles.len(),
            warmup,
            "starting backtest"
        );

        let cache = SeriesCache::new(candles);
        let account = self.simulate(candles, warmup, |index| {
            strategy
                .evaluate(&History::new(candles, index, &cache))
                .kind
        })?;

        let result = BacktestResult::from_account(strategy.name(), symbol, account);
        info!(
            strategy = strategy.name(),
            symbol,
            trades = result.total_trades,
            final_capital = result.final_capital,
            cached_series = cache.cached_ops(),
            "backtest finished"
        );
        Ok(result)
    }

    /// Replay a precomputed signal stream (one entry per candle) from the
    /// warm-up index.
    pub fn run_signals(
        &self,
        strategy_name: &str,
        symbol: &str,
        candles: &[Candle],
        signals: &[SignalKind],
    ) -> Result<BacktestResult, TradesimError> {
        let warmup = self.config.warmup;
        if candles.len() <= warmup {
            return Err(TradesimError::InsufficientData {
                bars: candles.len(),
                minimum: warmup,
            });
        }
        if signals.len() != candles.len() {
            return Err(TradesimError::Data {
                reason: format!(
                    "signal stream has {} entries for {} candles",
                    signals.len(),
                    candles.len()
                ),
            });
        }

        let account = self.simulate(candles, warmup, |index| signals[index])?;
        Ok(BacktestResult::from_account(strategy_name, symbol, account))
    }

    /// Drive the FLAT/LONG state machine over `candles[start..]`.
    ///
    /// The equity curve gets an initial sample (dated at the first candle)
    /// and then one sample per simulated bar.
    pub(crate) fn simulate(
        &self,
        candles: &[Candle],
        start: usize,
        mut signal_at: impl FnMut(usize) -> SignalKind,
    ) -> Result<Account, TradesimError> {
        let mut account = Account::new(self.config.initial_capital);
        if let Some(first) = candles.first() {
            account.record_equity(first.date, self.config.initial_capital);
        }

        for (index, candle) in candles.iter().enumerate().skip(start) {
            if self.cancel.is_cancelled() {
                info!(index, "backtest cancelled");
                return Err(TradesimError::Cancelled);
            }

            match signal_at(index) {
                SignalKind::Buy if !account.is_long() => {
                    match account.enter_long(candle.close, candle.date, index) {
                        EntryResult::Entered { quantity, cost } => {
                            debug!(date = %candle.date, price = candle.close, quantity, cost, "BUY");
                        }
                        EntryResult::InsufficientCapital => {
                            debug!(date = %candle.date, price = candle.close, cash = account.cash, "BUY skipped: insufficient cash");
                        }
                        EntryResult::AlreadyLong => {}
                    }
                }
                SignalKind::Sell => {
                    if let Some(trade) = account.exit_long(candle.close, candle.date) {
                        debug!(date = %candle.date, price = candle.close, pnl = trade.pnl, "SELL");
                    }
                }
                _ => {}
            }

            let equity = account.equity(candle.close);
            account.record_equity(candle.date, equity);
        }

        Ok(account)
    }
}

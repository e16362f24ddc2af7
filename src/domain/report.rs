//! Bulk consensus report: vote over the whole series, replay the votes from
//! the first bar, and keep a per-bar row for rendering.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::backtest::{BacktestEngine, BacktestResult};
use super::candle::{closes, Candle};
use super::consensus::ConsensusVoter;
use super::error::TradesimError;
use super::metrics::cagr_percent;
use super::signal::SignalKind;

/// Name recorded on bulk consensus results.
pub const CONSENSUS_REPORT_NAME: &str = "consensus";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub fast_ma: Option<f64>,
    pub slow_ma: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal: SignalKind,
    pub equity: f64,
}

/// Column labels for the indicator columns, e.g. `SMA50`, `SMA200`, `RSI14`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLabels {
    pub fast_ma: String,
    pub slow_ma: String,
    pub rsi: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusReport {
    pub result: BacktestResult,
    pub cagr_percent: f64,
    pub labels: ReportLabels,
    pub rows: Vec<ConsensusRow>,
}

/// Run the consensus vote over `candles` and simulate its signals from bar 0.
pub fn run_consensus_report(
    voter: &ConsensusVoter,
    engine: &BacktestEngine,
    candles: &[Candle],
    symbol: &str,
) -> Result<ConsensusReport, TradesimError> {
    let (Some(first), Some(last)) = (candles.first(), candles.last()) else {
        return Err(TradesimError::InsufficientData {
            bars: 0,
            minimum: 0,
        });
    };

    let analysis = voter.analyze(&closes(candles))?;
    let account = engine.simulate(candles, 0, |index| analysis.signals[index])?;

    // equity_curve[0] is the initial sample; bar i lands at i + 1
    let rows: Vec<ConsensusRow> = candles
        .iter()
        .enumerate()
        .map(|(i, c)| ConsensusRow {
            date: c.date,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            fast_ma: analysis.fast_ma.get(i),
            slow_ma: analysis.slow_ma.get(i),
            rsi: analysis.rsi.get(i),
            macd: analysis.macd.get(i),
            signal: analysis.signals[i],
            equity: account
                .equity_curve
                .get(i + 1)
                .map_or(account.initial_capital, |p| p.equity),
        })
        .collect();

    let result = BacktestResult::from_account(CONSENSUS_REPORT_NAME, symbol, account);
    let cagr_percent = cagr_percent(
        first.date,
        last.date,
        result.initial_capital,
        result.final_capital,
    );
    let config = voter.config();
    info!(
        symbol,
        bars = candles.len(),
        trades = result.total_trades,
        cagr_percent,
        "consensus report finished"
    );

    Ok(ConsensusReport {
        result,
        cagr_percent,
        labels: ReportLabels {
            fast_ma: config.fast_label(),
            slow_ma: config.slow_label(),
            rsi: config.rsi_label(),
        },
        rows,
    })
}

//! CSV report adapter implementing ReportPort.
//!
//! Backtest reports are a metric summary followed by the trade log. Consensus
//! reports have one row per bar with every number at two decimals and an empty
//! cell wherever an indicator is still warming up.

use std::fs;
use std::path::Path;

use csv::WriterBuilder;
use tracing::info;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TradesimError;
use crate::domain::report::ConsensusReport;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter;

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn optional(value: Option<f64>) -> String {
    value.map(money).unwrap_or_default()
}

fn ratio(value: f64) -> String {
    if value.is_infinite() {
        "inf".to_string()
    } else {
        money(value)
    }
}

fn csv_error(e: csv::Error) -> TradesimError {
    TradesimError::Io(std::io::Error::other(e))
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String, TradesimError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| TradesimError::Io(std::io::Error::other(e.to_string())))?;
    String::from_utf8(bytes).map_err(|e| TradesimError::Io(std::io::Error::other(e)))
}

pub fn render_backtest_csv(result: &BacktestResult) -> Result<String, TradesimError> {
    let mut wtr = WriterBuilder::new().flexible(true).from_writer(Vec::new());

    let summary: [(&str, String); 12] = [
        ("Strategy", result.strategy_name.clone()),
        ("Symbol", result.symbol.clone()),
        ("Initial Capital", money(result.initial_capital)),
        ("Final Capital", money(result.final_capital)),
        ("Total Return %", money(result.total_return_percent)),
        ("Win Rate %", money(result.win_rate * 100.0)),
        ("Max Drawdown %", money(result.max_drawdown_percent)),
        ("Sharpe Ratio", money(result.sharpe_ratio)),
        ("Profit Factor", ratio(result.profit_factor)),
        ("Total Trades", result.total_trades.to_string()),
        ("Winning Trades", result.winning_trades.to_string()),
        ("Losing Trades", result.losing_trades.to_string()),
    ];

    wtr.write_record(["Metric", "Value"]).map_err(csv_error)?;
    for (metric, value) in &summary {
        wtr.write_record([*metric, value.as_str()]).map_err(csv_error)?;
    }

    wtr.write_record([
        "Entry Date",
        "Entry Price",
        "Exit Date",
        "Exit Price",
        "Quantity",
        "PnL",
        "PnL %",
    ])
    .map_err(csv_error)?;
    for t in &result.trades {
        wtr.write_record([
            t.entry_date.to_string(),
            money(t.entry_price),
            t.exit_date.to_string(),
            money(t.exit_price),
            t.quantity.to_string(),
            money(t.pnl),
            money(t.pnl_percent * 100.0),
        ])
        .map_err(csv_error)?;
    }

    into_string(wtr)
}

pub fn render_consensus_csv(report: &ConsensusReport) -> Result<String, TradesimError> {
    let mut wtr = WriterBuilder::new().from_writer(Vec::new());

    wtr.write_record([
        "Date",
        "Open",
        "High",
        "Low",
        "Close",
        report.labels.fast_ma.as_str(),
        report.labels.slow_ma.as_str(),
        report.labels.rsi.as_str(),
        "MACD",
        "Signal",
        "Equity",
    ])
    .map_err(csv_error)?;

    for row in &report.rows {
        wtr.write_record([
            row.date.to_string(),
            money(row.open),
            money(row.high),
            money(row.low),
            money(row.close),
            optional(row.fast_ma),
            optional(row.slow_ma),
            optional(row.rsi),
            optional(row.macd),
            row.signal.to_string(),
            money(row.equity),
        ])
        .map_err(csv_error)?;
    }

    into_string(wtr)
}

impl ReportPort for CsvReportAdapter {
    fn write_backtest(
        &self,
        result: &BacktestResult,
        output_path: &Path,
    ) -> Result<(), TradesimError> {
        fs::write(output_path, render_backtest_csv(result)?)?;
        info!(path = %output_path.display(), "wrote backtest report");
        Ok(())
    }

    fn write_consensus(
        &self,
        report: &ConsensusReport,
        output_path: &Path,
    ) -> Result<(), TradesimError> {
        fs::write(output_path, render_consensus_csv(report)?)?;
        info!(path = %output_path.display(), rows = report.rows.len(), "wrote consensus report");
        Ok(())
    }
}

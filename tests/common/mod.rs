#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
pub use tradesim::domain::candle::Candle;
use tradesim::domain::error::TradesimError;
use tradesim::domain::history::History;
use tradesim::domain::signal::Signal;
use tradesim::domain::strategy::StrategyEvaluator;
use tradesim::ports::data_port::PriceHistoryPort;

pub struct MockPriceHistory {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceHistory {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceHistoryPort for MockPriceHistory {
    fn fetch_candles(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Candle>, TradesimError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TradesimError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|candles| {
                candles
                    .iter()
                    .filter(|c| start.is_none_or(|s| c.date >= s))
                    .filter(|c| end.is_none_or(|e| c.date <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradesimError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Buys when the visible history reaches `buy_at` bars and sells at `sell_at`.
pub struct Scripted {
    pub buy_at: usize,
    pub sell_at: usize,
}

impl StrategyEvaluator for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn evaluate(&self, history: &History<'_>) -> Signal {
        if history.len() == self.buy_at {
            Signal::buy(1.0)
        } else if history.len() == self.sell_at {
            Signal::sell(1.0)
        } else {
            Signal::hold()
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One candle per calendar day from 2020-01-01 with the given closes.
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    let start = date(2020, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000.0,
        })
        .collect()
}

/// close = 100 + index
pub fn linear_candles(n: usize) -> Vec<Candle> {
    make_candles(&(0..n).map(|i| 100.0 + i as f64).collect::<Vec<_>>())
}

pub fn sine_candles(n: usize, period: f64, amplitude: f64) -> Vec<Candle> {
    make_candles(
        &(0..n)
            .map(|i| 100.0 + amplitude * (i as f64 * std::f64::consts::TAU / period).sin())
            .collect::<Vec<_>>(),
    )
}

pub fn candles_to_csv(candles: &[Candle]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for c in candles {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            c.date, c.open, c.high, c.low, c.close, c.volume
        ));
    }
    out
}

pub fn write_symbol_csv(dir: &Path, symbol: &str, candles: &[Candle]) {
    std::fs::write(dir.join(format!("{symbol}.csv")), candles_to_csv(candles)).unwrap();
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

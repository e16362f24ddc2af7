//! CSV price history adapter: one `<SYMBOL>.csv` per symbol under a data
//! directory, header `date,open,high,low,close,volume`.

use crate::domain::candle::Candle;
use crate::domain::error::TradesimError;
use crate::ports::data_port::PriceHistoryPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

const EXTENSION: &str = "csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.{}", symbol, EXTENSION))
    }
}

impl PriceHistoryPort for CsvAdapter {
    fn fetch_candles(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Candle>, TradesimError> {
        let path = self.csv_path(symbol);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(symbol, path = %path.display(), "no price file");
                return Ok(Vec::new());
            }
            Err(e) => return Err(TradesimError::Io(e)),
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut candles = Vec::new();

        for (row, result) in rdr.deserialize::<Candle>().enumerate() {
            let candle = result.map_err(|e| TradesimError::Data {
                reason: format!("{} row {}: {}", path.display(), row + 1, e),
            })?;

            if start_date.is_some_and(|start| candle.date < start)
                || end_date.is_some_and(|end| candle.date > end)
            {
                continue;
            }
            candles.push(candle);
        }

        candles.sort_by_key(|c| c.date);
        debug!(symbol, bars = candles.len(), "loaded candles");
        Ok(candles)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradesimError> {
        let mut symbols = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.push(stem.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

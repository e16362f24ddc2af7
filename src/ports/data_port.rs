//! Price history port trait.

use crate::domain::candle::Candle;
use crate::domain::error::TradesimError;
use chrono::NaiveDate;

pub trait PriceHistoryPort {
    /// Date-ascending candles for `symbol`, optionally bounded by an inclusive
    /// date range. An unknown symbol yields an empty vec, not an error.
    fn fetch_candles(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Candle>, TradesimError>;

    fn list_symbols(&self) -> Result<Vec<String>, TradesimError>;
}

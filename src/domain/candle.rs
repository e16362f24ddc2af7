//! Daily OHLCV candle.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Close-price channel of a candle history.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// True when dates are strictly ascending.
pub fn is_ascending(candles: &[Candle]) -> bool {
    candles.windows(2).all(|w| w[0].date < w[1].date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_candle() -> Candle {
        Candle {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50000.0,
        }
    }

    #[test]
    fn typical_price() {
        let c = sample_candle();
        let expected = (110.0 + 90.0 + 105.0) / 3.0;
        assert!((c.typical_price() - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn range() {
        assert!((sample_candle().range() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn closes_extracts_channel() {
        let mut second = sample_candle();
        second.close = 107.5;
        assert_eq!(closes(&[sample_candle(), second]), vec![105.0, 107.5]);
    }

    #[test]
    fn ascending_check() {
        let first = sample_candle();
        let mut second = sample_candle();
        second.date = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        assert!(is_ascending(&[first.clone(), second.clone()]));
        assert!(!is_ascending(&[second, first.clone()]));
        assert!(is_ascending(&[first]));
    }
}

//! Normalizes indicator-library output into full-length aligned series.

use std::fmt;
use std::sync::Arc;

use crate::domain::aligned::AlignedSeries;
use crate::domain::error::TradesimError;
use crate::domain::indicator::{IndicatorField, IndicatorOp, PatternOp, TaCore};
use crate::ports::indicator_port::{IndicatorLibrary, OhlcInput};

#[derive(Clone)]
pub struct IndicatorAdapter {
    library: Arc<dyn IndicatorLibrary>,
}

impl IndicatorAdapter {
    pub fn new(library: Arc<dyn IndicatorLibrary>) -> Self {
        Self { library }
    }

    /// One aligned series per output of `op`, each of length `input.len()`.
    pub fn compute(
        &self,
        op: &IndicatorOp,
        input: &[f64],
    ) -> Result<Vec<AlignedSeries>, TradesimError> {
        op.validate()?;
        let raw = self.library.compute(op, input)?;
        if raw.len() != op.output_count() {
            return Err(TradesimError::UnsupportedIndicator {
                name: op.to_string(),
                reason: format!(
                    "library returned {} outputs, expected {}",
                    raw.len(),
                    op.output_count()
                ),
            });
        }
        Ok(raw
            .iter()
            .map(|r| AlignedSeries::align(r, input.len()))
            .collect())
    }

    /// A single output of `op`.
    pub fn series(
        &self,
        op: &IndicatorOp,
        field: IndicatorField,
        input: &[f64],
    ) -> Result<AlignedSeries, TradesimError> {
        let index = field.output_index(op)?;
        let mut outputs = self.compute(op, input)?;
        Ok(outputs.swap_remove(index))
    }

    /// Pattern scores aligned to the bars of `input`.
    pub fn pattern(
        &self,
        pattern: &PatternOp,
        input: &OhlcInput<'_>,
    ) -> Result<AlignedSeries, TradesimError> {
        input.check()?;
        let raw = self.library.compute_pattern(pattern, input)?;
        Ok(AlignedSeries::align(&raw, input.len()))
    }
}

impl Default for IndicatorAdapter {
    fn default() -> Self {
        Self::new(Arc::new(TaCore))
    }
}

impl fmt::Debug for IndicatorAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndicatorAdapter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::indicator_port::RawSeries;

    struct FixedLibrary {
        outputs: Vec<RawSeries>,
    }

    impl IndicatorLibrary for FixedLibrary {
        fn compute(
            &self,
            _op: &IndicatorOp,
            _input: &[f64],
        ) -> Result<Vec<RawSeries>, TradesimError> {
            Ok(self.outputs.clone())
        }

        fn compute_pattern(
            &self,
            _pattern: &PatternOp,
            input: &OhlcInput<'_>,
        ) -> Result<RawSeries, TradesimError> {
            Ok(self
                .outputs
                .first()
                .cloned()
                .unwrap_or_else(|| RawSeries::empty(input.len())))
        }
    }

    fn input(n: usize) -> Vec<f64> {
        (0..n).map(|i| 10.0 + i as f64).collect()
    }

    #[test]
    fn aligns_library_output() {
        let adapter = IndicatorAdapter::new(Arc::new(FixedLibrary {
            outputs: vec![RawSeries {
                begin_index: 3,
                values: vec![1.0, 2.0],
            }],
        }));
        let out = adapter.series(&IndicatorOp::Sma(4), IndicatorField::Value, &input(5)).unwrap();
        assert_eq!(out.len(), 5);
        assert_eq!(out.get(2), None);
        assert_eq!(out.get(3), Some(1.0));
        assert_eq!(out.get(4), Some(2.0));
    }

    #[test]
    fn multi_output_aligned_independently() {
        let adapter = IndicatorAdapter::default();
        let macd = IndicatorOp::Macd {
            fast: 3,
            slow: 5,
            signal: 3,
        };
        let out = adapter.compute(&macd, &input(20)).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].begin_index(), 4);
        assert_eq!(out[1].begin_index(), 6);
        assert_eq!(out[2].begin_index(), 6);
        assert!(out.iter().all(|s| s.len() == 20));
    }

    #[test]
    fn short_input_is_entirely_undefined() {
        let adapter = IndicatorAdapter::default();
        let out = adapter.series(&IndicatorOp::Sma(10), IndicatorField::Value, &input(4)).unwrap();
        assert_eq!(out.len(), 4);
        assert!((0..4).all(|i| out.get(i).is_none()));
    }

    #[test]
    fn wrong_output_count_is_rejected() {
        let adapter = IndicatorAdapter::new(Arc::new(FixedLibrary { outputs: vec![] }));
        let err = adapter.compute(&IndicatorOp::Ema(3), &input(5)).unwrap_err();
        assert!(matches!(err, TradesimError::UnsupportedIndicator { .. }));
    }

    #[test]
    fn pattern_scores_are_aligned() {
        let adapter = IndicatorAdapter::new(Arc::new(FixedLibrary {
            outputs: vec![RawSeries {
                begin_index: 2,
                values: vec![0.0, 100.0],
            }],
        }));
        let close = input(4);
        let ohlc = OhlcInput {
            open: &close,
            high: &close,
            low: &close,
            close: &close,
        };
        let out = adapter.pattern(&PatternOp::Engulfing, &ohlc).unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out.get(1), None);
        assert_eq!(out.get(3), Some(100.0));
    }

    #[test]
    fn mismatched_channels_are_rejected() {
        let adapter = IndicatorAdapter::default();
        let close = input(4);
        let ohlc = OhlcInput {
            open: &close[..3],
            high: &close,
            low: &close,
            close: &close,
        };
        let err = adapter.pattern(&PatternOp::Hammer, &ohlc).unwrap_err();
        assert!(matches!(err, TradesimError::Data { .. }));
    }

    #[test]
    fn zero_period_fails_before_library_call() {
        let adapter = IndicatorAdapter::new(Arc::new(FixedLibrary { outputs: vec![] }));
        let err = adapter.compute(&IndicatorOp::Rsi(0), &input(30)).unwrap_err();
        assert!(matches!(err, TradesimError::UnsupportedIndicator { .. }));
    }

    #[test]
    fn repeated_calls_are_identical() {
        let adapter = IndicatorAdapter::default();
        let data: Vec<f64> = (0..50).map(|i| (i as f64 * 0.37).cos() * 3.0 + 20.0).collect();
        let a = adapter.series(&IndicatorOp::Rsi(14), IndicatorField::Value, &data).unwrap();
        let b = adapter.series(&IndicatorOp::Rsi(14), IndicatorField::Value, &data).unwrap();
        for i in 0..data.len() {
            assert_eq!(a.get(i).map(f64::to_bits), b.get(i).map(f64::to_bits));
        }
    }

    #[test]
    fn prefix_values_match_full_series() {
        let adapter = IndicatorAdapter::default();
        let data: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.21).sin() * 8.0 + i as f64 * 0.1)
            .collect();
        let ops = [
            (IndicatorOp::Sma(10), IndicatorField::Value),
            (IndicatorOp::Ema(10), IndicatorField::Value),
            (IndicatorOp::Wma(10), IndicatorField::Value),
            (IndicatorOp::Rsi(14), IndicatorField::Value),
            (IndicatorOp::Roc(7), IndicatorField::Value),
            (IndicatorOp::StdDev(20), IndicatorField::Value),
            (
                IndicatorOp::Macd {
                    fast: 12,
                    slow: 26,
                    signal: 9,
                },
                IndicatorField::MacdHist,
            ),
            (IndicatorOp::bbands(20, 2.0, 2.0), IndicatorField::BbLower),
        ];
        for (op, field) in ops {
            let full = adapter.series(&op, field, &data).unwrap();
            for end in [1, 15, 40, 77, 120] {
                let prefix = adapter.series(&op, field, &data[..end]).unwrap();
                assert_eq!(
                    prefix.last().map(f64::to_bits),
                    full.get(end - 1).map(f64::to_bits),
                    "{op} at prefix length {end}"
                );
            }
        }
    }
}

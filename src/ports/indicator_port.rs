//! Indicator-math library port.
//!
//! A library computes an operation over an input series and may return fewer
//! values than it was given. Each output buffer carries the input index of its
//! first value; callers never see the raw buffers directly but go through
//! [`crate::domain::indicator_adapter::IndicatorAdapter`].

use crate::domain::error::TradesimError;
use crate::domain::indicator::{IndicatorOp, PatternOp};

/// One truncated output buffer: `values[k]` belongs to input index `begin_index + k`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    pub begin_index: usize,
    pub values: Vec<f64>,
}

impl RawSeries {
    /// No computable values for an input of length `len`.
    pub fn empty(len: usize) -> Self {
        RawSeries {
            begin_index: len,
            values: Vec::new(),
        }
    }
}

/// Price channels for operations that read whole bars.
#[derive(Debug, Clone, Copy)]
pub struct OhlcInput<'a> {
    pub open: &'a [f64],
    pub high: &'a [f64],
    pub low: &'a [f64],
    pub close: &'a [f64],
}

impl OhlcInput<'_> {
    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// All four channels must have the same length.
    pub fn check(&self) -> Result<(), TradesimError> {
        let len = self.len();
        if [self.open.len(), self.high.len(), self.low.len()]
            .iter()
            .any(|&n| n != len)
        {
            return Err(TradesimError::Data {
                reason: "open/high/low/close channels differ in length".to_string(),
            });
        }
        Ok(())
    }
}

pub trait IndicatorLibrary: Send + Sync {
    /// Returns one buffer per output of `op`, in the order given by
    /// [`IndicatorOp::output_count`].
    fn compute(&self, op: &IndicatorOp, input: &[f64]) -> Result<Vec<RawSeries>, TradesimError>;

    /// Candlestick pattern scores: +100 bullish, -100 bearish, 0 when absent.
    fn compute_pattern(
        &self,
        pattern: &PatternOp,
        input: &OhlcInput<'_>,
    ) -> Result<RawSeries, TradesimError>;
}

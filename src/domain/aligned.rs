//! Full-length indicator series aligned to input indices.
//!
//! Positions before `begin_index` hold `NaN`, which accessors surface as `None`.

use crate::ports::indicator_port::RawSeries;

#[derive(Debug, Clone)]
pub struct AlignedSeries {
    values: Vec<f64>,
    begin_index: usize,
}

impl AlignedSeries {
    /// Right-align a truncated buffer into a series of length `len`.
    /// Values past `len` are dropped.
    pub fn align(raw: &RawSeries, len: usize) -> Self {
        let begin_index = raw.begin_index.min(len);
        let mut values = vec![f64::NAN; len];
        for (slot, &v) in values[begin_index..].iter_mut().zip(raw.values.iter()) {
            *slot = v;
        }
        AlignedSeries {
            values,
            begin_index,
        }
    }

    pub fn undefined(len: usize) -> Self {
        AlignedSeries {
            values: vec![f64::NAN; len],
            begin_index: len,
        }
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        if index < self.begin_index {
            return None;
        }
        self.values.get(index).copied().filter(|v| !v.is_nan())
    }

    pub fn is_defined(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.len().checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn begin_index(&self) -> usize {
        self.begin_index
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

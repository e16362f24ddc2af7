//! Rolling population standard deviation.
//!
//! Each window is evaluated with a two-pass mean/variance. First output at
//! index n-1.

use crate::ports::indicator_port::RawSeries;

pub fn calculate_stddev(input: &[f64], period: usize) -> RawSeries {
    if period == 0 || input.len() < period {
        return RawSeries::empty(input.len());
    }

    let values = input
        .windows(period)
        .map(|window| window_stats(window).1)
        .collect();

    RawSeries {
        begin_index: period - 1,
        values,
    }
}

/// Mean and population standard deviation of a window.
pub(crate) fn window_stats(window: &[f64]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

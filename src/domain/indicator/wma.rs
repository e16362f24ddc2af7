//! Weighted Moving Average.
//!
//! Linear weights 1..=n, newest input heaviest. First output at index n-1.

use crate::ports::indicator_port::RawSeries;

pub fn calculate_wma(input: &[f64], period: usize) -> RawSeries {
    if period == 0 || input.len() < period {
        return RawSeries::empty(input.len());
    }

    let denominator = (period * (period + 1)) as f64 / 2.0;
    let values = input
        .windows(period)
        .map(|window| {
            window
                .iter()
                .enumerate()
                .map(|(w, &x)| (w + 1) as f64 * x)
                .sum::<f64>()
                / denominator
        })
        .collect();

    RawSeries {
        begin_index: period - 1,
        values,
    }
}

//! Bollinger Bands.
//!
//! Middle = SMA or EMA of the input, bands = middle +/- dev * population
//! stddev of the window. Outputs are `[upper, middle, lower]`, all starting at
//! index n-1.

use super::ema::calculate_ema;
use super::stddev::window_stats;
use super::MaType;
use crate::ports::indicator_port::RawSeries;

pub fn calculate_bollinger(
    input: &[f64],
    period: usize,
    dev_up: f64,
    dev_down: f64,
    ma: MaType,
) -> [RawSeries; 3] {
    if period == 0 || input.len() < period {
        return [
            RawSeries::empty(input.len()),
            RawSeries::empty(input.len()),
            RawSeries::empty(input.len()),
        ];
    }

    // EMA output starts at n-1 too, so it lines up with the windows
    let ema = match ma {
        MaType::Ema => Some(calculate_ema(input, period).values),
        MaType::Sma => None,
    };

    let count = input.len() - period + 1;
    let mut upper = Vec::with_capacity(count);
    let mut middle = Vec::with_capacity(count);
    let mut lower = Vec::with_capacity(count);

    for (k, window) in input.windows(period).enumerate() {
        let (mean, sd) = window_stats(window);
        let mid = ema.as_ref().and_then(|e| e.get(k).copied()).unwrap_or(mean);
        upper.push(mid + dev_up * sd);
        middle.push(mid);
        lower.push(mid - dev_down * sd);
    }

    let begin_index = period - 1;
    [
        RawSeries {
            begin_index,
            values: upper,
        },
        RawSeries {
            begin_index,
            values: middle,
        },
        RawSeries {
            begin_index,
            values: lower,
        },
    ]
}

//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Outputs are `[line, signal, histogram]`, each with its own begin index:
//! the line starts at slow-1, signal and histogram at slow-1 + signal-1.
//! A fast period longer than the slow one is swapped.

use super::ema::calculate_ema;
use crate::ports::indicator_port::RawSeries;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    input: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> [RawSeries; 3] {
    let len = input.len();
    let (fast, slow) = if slow < fast { (slow, fast) } else { (fast, slow) };
    let empty = || {
        [
            RawSeries::empty(len),
            RawSeries::empty(len),
            RawSeries::empty(len),
        ]
    };
    if fast == 0 || signal_period == 0 || len < slow {
        return empty();
    }

    let ema_fast = calculate_ema(input, fast);
    let ema_slow = calculate_ema(input, slow);

    let line_begin = ema_slow.begin_index;
    let fast_offset = line_begin - ema_fast.begin_index;
    let line: Vec<f64> = ema_slow
        .values
        .iter()
        .zip(&ema_fast.values[fast_offset..])
        .map(|(s, f)| f - s)
        .collect();

    let signal_raw = calculate_ema(&line, signal_period);
    let (signal, histogram) = if signal_raw.values.is_empty() {
        (RawSeries::empty(len), RawSeries::empty(len))
    } else {
        let signal_begin = line_begin + signal_raw.begin_index;
        let histogram = line[signal_raw.begin_index..]
            .iter()
            .zip(&signal_raw.values)
            .map(|(l, s)| l - s)
            .collect();
        (
            RawSeries {
                begin_index: signal_begin,
                values: signal_raw.values,
            },
            RawSeries {
                begin_index: signal_begin,
                values: histogram,
            },
        )
    };

    [
        RawSeries {
            begin_index: line_begin,
            values: line,
        },
        signal,
        histogram,
    ]
}

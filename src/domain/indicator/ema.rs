//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with the SMA of the first n inputs, then
//! EMA[i] = x[i]*k + EMA[i-1]*(1-k). First output at index n-1.

use crate::ports::indicator_port::RawSeries;

pub fn calculate_ema(input: &[f64], period: usize) -> RawSeries {
    if period == 0 || input.len() < period {
        return RawSeries::empty(input.len());
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(input.len() - period + 1);
    let mut ema = input[..period].iter().sum::<f64>() / period as f64;
    values.push(ema);

    for &x in &input[period..] {
        ema = x * k + ema * (1.0 - k);
        values.push(ema);
    }

    RawSeries {
        begin_index: period - 1,
        values,
    }
}

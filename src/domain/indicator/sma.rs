//! Simple Moving Average.
//!
//! Rolling sum over the last n inputs. First output at index n-1.

use crate::ports::indicator_port::RawSeries;

pub fn calculate_sma(input: &[f64], period: usize) -> RawSeries {
    if period == 0 || input.len() < period {
        return RawSeries::empty(input.len());
    }

    let n = period as f64;
    let mut values = Vec::with_capacity(input.len() - period + 1);
    let mut sum: f64 = input[..period].iter().sum();
    values.push(sum / n);

    for (i, &x) in input.iter().enumerate().skip(period) {
        sum += x - input[i - period];
        values.push(sum / n);
    }

    RawSeries {
        begin_index: period - 1,
        values,
    }
}

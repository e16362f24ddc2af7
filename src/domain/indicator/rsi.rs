//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! First output at index n (n price changes are needed for the initial average).

use crate::ports::indicator_port::RawSeries;

pub fn calculate_rsi(input: &[f64], period: usize) -> RawSeries {
    if period == 0 || input.len() <= period {
        return RawSeries::empty(input.len());
    }

    let n = period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for w in input[..=period].windows(2) {
        let (gain, loss) = split_change(w[1] - w[0]);
        avg_gain += gain;
        avg_loss += loss;
    }
    avg_gain /= n;
    avg_loss /= n;

    let mut values = Vec::with_capacity(input.len() - period);
    values.push(rsi_value(avg_gain, avg_loss));

    for w in input[period..].windows(2) {
        let (gain, loss) = split_change(w[1] - w[0]);
        avg_gain = (avg_gain * (n - 1.0) + gain) / n;
        avg_loss = (avg_loss * (n - 1.0) + loss) / n;
        values.push(rsi_value(avg_gain, avg_loss));
    }

    RawSeries {
        begin_index: period,
        values,
    }
}

fn split_change(change: f64) -> (f64, f64) {
    if change > 0.0 {
        (change, 0.0)
    } else {
        (0.0, -change)
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_warmup() {
        let out = calculate_rsi(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(out.begin_index, 3);
        assert_eq!(out.values.len(), 2);
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let out = calculate_rsi(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3);
        for v in &out.values {
            assert!((v - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let out = calculate_rsi(&[6.0, 5.0, 4.0, 3.0, 2.0], 3);
        for v in &out.values {
            assert!(v.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn rsi_first_value_uses_simple_average() {
        // changes: +2, -1, +1 -> avg gain 1.0, avg loss 1/3
        let out = calculate_rsi(&[10.0, 12.0, 11.0, 12.0], 3);
        let expected = 100.0 - 100.0 / (1.0 + 1.0 / (1.0 / 3.0));
        assert!((out.values[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn rsi_wilder_smoothing() {
        // after seed (gain 1.0, loss 1/3), next change -3
        let out = calculate_rsi(&[10.0, 12.0, 11.0, 12.0, 9.0], 3);
        let avg_gain = (1.0 * 2.0 + 0.0) / 3.0;
        let avg_loss = ((1.0 / 3.0) * 2.0 + 3.0) / 3.0;
        let expected = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
        assert!((out.values[1] - expected).abs() < 1e-9);
    }

    #[test]
    fn rsi_needs_more_than_period_inputs() {
        let out = calculate_rsi(&[1.0, 2.0, 3.0], 3);
        assert_eq!(out.begin_index, 3);
        assert!(out.values.is_empty());
    }

    #[test]
    fn rsi_bounded() {
        let input: Vec<f64> = (0..60).map(|i| 50.0 + (i as f64 * 0.7).sin() * 10.0).collect();
        let out = calculate_rsi(&input, 14);
        for v in &out.values {
            assert!((0.0..=100.0).contains(v));
        }
    }
}

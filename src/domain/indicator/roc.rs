//! Rate of Change: ((x[i] - x[i-n]) / x[i-n]) * 100. First output at index n.

use crate::ports::indicator_port::RawSeries;

pub fn calculate_roc(input: &[f64], period: usize) -> RawSeries {
    if period == 0 || input.len() <= period {
        return RawSeries::empty(input.len());
    }

    let values = input
        .iter()
        .zip(&input[period..])
        .map(|(&prev, &cur)| {
            if prev == 0.0 {
                0.0
            } else {
                (cur - prev) / prev * 100.0
            }
        })
        .collect();

    RawSeries {
        begin_index: period,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roc_basic() {
        let out = calculate_roc(&[100.0, 105.0, 110.0], 2);
        assert_eq!(out.begin_index, 2);
        assert_eq!(out.values.len(), 1);
        assert!((out.values[0] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn roc_zero_base_is_zero() {
        let out = calculate_roc(&[0.0, 5.0], 1);
        assert!((out.values[0] - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn roc_negative() {
        let out = calculate_roc(&[100.0, 90.0], 1);
        assert!((out.values[0] + 10.0).abs() < 1e-12);
    }
}

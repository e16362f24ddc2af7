//! Performance metrics over a finished run.
//!
//! Percent-valued fields are scaled by 100; `win_rate` is a fraction.

use chrono::NaiveDate;

use super::account::EquityPoint;
use super::position::ClosedTrade;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return_percent: f64,
    pub win_rate: f64,
    pub max_drawdown_percent: f64,
    pub sharpe_ratio: f64,
    pub profit_factor: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
}

impl Metrics {
    pub fn compute(trades: &[ClosedTrade], equity_curve: &[EquityPoint], initial_capital: f64) -> Self {
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return_percent = if initial_capital > 0.0 {
            (final_equity - initial_capital) / initial_capital * 100.0
        } else {
            0.0
        };

        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;

        for trade in trades {
            if trade.pnl > 0.0 {
                winning_trades += 1;
                gross_profit += trade.pnl;
            } else {
                // breakeven counts as a loss
                losing_trades += 1;
                gross_loss += trade.pnl.abs();
            }
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        Metrics {
            total_return_percent,
            win_rate,
            max_drawdown_percent: compute_drawdown(equity_curve) * 100.0,
            sharpe_ratio: compute_sharpe(equity_curve),
            profit_factor,
            total_trades,
            winning_trades,
            losing_trades,
        }
    }
}

/// Largest decline from the running peak, as a fraction.
fn compute_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let Some(first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

/// Annualized Sharpe of simple per-step returns, zero risk-free rate,
/// population standard deviation.
fn compute_sharpe(equity_curve: &[EquityPoint]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            let curr = w[1].equity;
            if prev > 0.0 {
                (curr - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        (mean / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

/// Compound annual growth rate in percent between two calendar dates.
pub fn cagr_percent(start: NaiveDate, end: NaiveDate, initial: f64, final_equity: f64) -> f64 {
    let years = (end - start).num_days() as f64 / DAYS_PER_YEAR;
    if years <= 0.0 || initial <= 0.0 {
        return 0.0;
    }
    ((final_equity / initial).powf(1.0 / years) - 1.0) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn make_equity_curve(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| EquityPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                equity: v,
            })
            .collect()
    }

    fn make_trade(pnl: f64) -> ClosedTrade {
        let entry_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ClosedTrade {
            entry_date,
            entry_price: 100.0,
            exit_date: entry_date + chrono::Duration::days(5),
            exit_price: 100.0 + pnl / 100.0,
            quantity: 100,
            pnl,
            pnl_percent: pnl / 10_000.0,
        }
    }

    #[test]
    fn metrics_empty_run() {
        let metrics = Metrics::compute(&[], &[], 10_000.0);
        assert_eq!(metrics.total_return_percent, 0.0);
        assert_eq!(metrics.total_trades, 0);
        assert_eq!(metrics.win_rate, 0.0);
        assert_eq!(metrics.profit_factor, 0.0);
        assert_eq!(metrics.max_drawdown_percent, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
    }

    #[test]
    fn metrics_total_return_percent() {
        let curve = make_equity_curve(&[100_000.0, 110_000.0]);
        let metrics = Metrics::compute(&[], &curve, 100_000.0);
        assert_relative_eq!(metrics.total_return_percent, 10.0, epsilon = 1e-9);

        let curve = make_equity_curve(&[100_000.0, 90_000.0]);
        let metrics = Metrics::compute(&[], &curve, 100_000.0);
        assert_relative_eq!(metrics.total_return_percent, -10.0, epsilon = 1e-9);
    }

    #[test]
    fn metrics_breakeven_counts_as_losing() {
        let trades = vec![make_trade(100.0), make_trade(-50.0), make_trade(200.0), make_trade(0.0)];
        let metrics = Metrics::compute(&trades, &make_equity_curve(&[1.0, 1.0]), 1.0);
        assert_eq!(metrics.total_trades, 4);
        assert_eq!(metrics.winning_trades, 2);
        assert_eq!(metrics.losing_trades, 2);
        assert_relative_eq!(metrics.win_rate, 0.5);
    }

    #[test]
    fn metrics_profit_factor() {
        let trades = vec![make_trade(100.0), make_trade(-50.0), make_trade(200.0)];
        let metrics = Metrics::compute(&trades, &[], 1.0);
        assert_relative_eq!(metrics.profit_factor, 6.0, epsilon = 1e-9);
    }

    #[test]
    fn metrics_profit_factor_without_losses_is_infinite() {
        let metrics = Metrics::compute(&[make_trade(10.0)], &[], 1.0);
        assert!(metrics.profit_factor.is_infinite());
    }

    #[test]
    fn metrics_profit_factor_only_breakeven_is_zero() {
        let metrics = Metrics::compute(&[make_trade(0.0)], &[], 1.0);
        assert_eq!(metrics.profit_factor, 0.0);
    }

    #[test]
    fn metrics_max_drawdown() {
        let curve = make_equity_curve(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0]);
        assert_relative_eq!(compute_drawdown(&curve), (110.0 - 80.0) / 110.0, epsilon = 1e-12);
    }

    #[test]
    fn metrics_sharpe_ratio_positive() {
        let values: Vec<f64> = (0..253)
            .map(|i| 100_000.0 * (1.0 + 0.001 * (i as f64)))
            .collect();
        assert!(compute_sharpe(&make_equity_curve(&values)) > 0.0);
    }

    #[test]
    fn metrics_sharpe_flat_curve_is_zero() {
        let curve = make_equity_curve(&[100.0; 10]);
        assert_eq!(compute_sharpe(&curve), 0.0);
    }

    #[test]
    fn metrics_sharpe_known_value() {
        // returns +10%, -10%: mean 0
        let curve = make_equity_curve(&[100.0, 110.0, 99.0]);
        assert_relative_eq!(compute_sharpe(&curve), 0.0, epsilon = 1e-12);
        // returns +10%, +20%: mean .15, population sd .05
        let curve = make_equity_curve(&[100.0, 110.0, 132.0]);
        assert_relative_eq!(compute_sharpe(&curve), 3.0 * 252f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn cagr_over_two_years() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let end = start + chrono::Duration::days(731); // 2.0014 years
        let cagr = cagr_percent(start, end, 10_000.0, 12_100.0);
        assert!((cagr - 10.0).abs() < 0.01);
    }

    #[test]
    fn cagr_zero_span_is_zero() {
        let d = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(cagr_percent(d, d, 10_000.0, 20_000.0), 0.0);
    }

    proptest! {
        #[test]
        fn drawdown_is_bounded(values in prop::collection::vec(1.0f64..1e6, 1..200)) {
            let dd = compute_drawdown(&make_equity_curve(&values)) * 100.0;
            prop_assert!((0.0..=100.0).contains(&dd));
            let non_decreasing = values.windows(2).all(|w| w[1] >= w[0]);
            prop_assert_eq!(dd == 0.0, non_decreasing);
        }
    }
}

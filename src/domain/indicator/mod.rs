//! Technical indicator operations.
//!
//! This module provides:
//! - `IndicatorOp`: indicator identity + parameters (serves as cache key)
//! - `IndicatorField`: which output of a multi-output operation to read
//! - `MaType`: the moving average behind a Bollinger middle band
//! - `PatternOp`: candlestick patterns scored over open/high/low/close
//! - `TaCore`: the built-in indicator-math library behind
//!   [`IndicatorLibrary`](crate::ports::indicator_port::IndicatorLibrary)
//!
//! Every calculation walks its input strictly forward, so the value produced at
//! index `i` depends only on inputs `0..=i` and is bit-identical whether it is
//! computed over a prefix or over the full series.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod pattern;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod wma;

pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use pattern::PatternOp;
pub use roc::calculate_roc;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stddev::calculate_stddev;
pub use wma::calculate_wma;

use crate::domain::error::TradesimError;
use crate::ports::indicator_port::{IndicatorLibrary, OhlcInput, RawSeries};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default Bollinger band width when a DSL reference omits it.
pub const DEFAULT_BB_DEVIATION: f64 = 2.0;

/// Moving average used for a Bollinger middle band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaType {
    #[default]
    Sma,
    Ema,
}

impl MaType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sma" => Some(MaType::Sma),
            "ema" => Some(MaType::Ema),
            _ => None,
        }
    }
}

impl fmt::Display for MaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaType::Sma => write!(f, "SMA"),
            MaType::Ema => write!(f, "EMA"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorOp {
    Sma(usize),
    Ema(usize),
    Wma(usize),
    Rsi(usize),
    Roc(usize),
    StdDev(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bbands {
        period: usize,
        dev_up_x100: u32,
        dev_down_x100: u32,
        ma: MaType,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorField {
    Value,
    MacdLine,
    MacdSignal,
    MacdHist,
    BbUpper,
    BbMiddle,
    BbLower,
}

impl IndicatorOp {
    /// Bollinger bands around an SMA middle.
    pub fn bbands(period: usize, dev_up: f64, dev_down: f64) -> Self {
        Self::bbands_with(period, dev_up, dev_down, MaType::Sma)
    }

    pub fn bbands_with(period: usize, dev_up: f64, dev_down: f64, ma: MaType) -> Self {
        IndicatorOp::Bbands {
            period,
            dev_up_x100: deviation_to_x100(dev_up),
            dev_down_x100: deviation_to_x100(dev_down),
            ma,
        }
    }

    pub fn output_count(&self) -> usize {
        match self {
            IndicatorOp::Macd { .. } | IndicatorOp::Bbands { .. } => 3,
            _ => 1,
        }
    }

    /// Number of leading inputs consumed before the primary output is defined.
    pub fn lookback(&self) -> usize {
        match *self {
            IndicatorOp::Sma(p)
            | IndicatorOp::Ema(p)
            | IndicatorOp::Wma(p)
            | IndicatorOp::StdDev(p)
            | IndicatorOp::Bbands { period: p, .. } => p.saturating_sub(1),
            IndicatorOp::Rsi(p) | IndicatorOp::Roc(p) => p,
            IndicatorOp::Macd { fast, slow, signal } => {
                fast.max(slow).saturating_sub(1) + signal.saturating_sub(1)
            }
        }
    }

    pub fn validate(&self) -> Result<(), TradesimError> {
        let zero_period = match *self {
            IndicatorOp::Sma(p)
            | IndicatorOp::Ema(p)
            | IndicatorOp::Wma(p)
            | IndicatorOp::Rsi(p)
            | IndicatorOp::Roc(p)
            | IndicatorOp::StdDev(p)
            | IndicatorOp::Bbands { period: p, .. } => p == 0,
            IndicatorOp::Macd { fast, slow, signal } => fast == 0 || slow == 0 || signal == 0,
        };
        if zero_period {
            return Err(TradesimError::UnsupportedIndicator {
                name: self.to_string(),
                reason: "periods must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve a DSL indicator reference such as `RSI(14)` or `BB_LOWER(20, 2.5)`.
    pub fn from_expression(
        name: &str,
        params: &[f64],
    ) -> Result<(IndicatorOp, IndicatorField), TradesimError> {
        let unsupported = |reason: String| TradesimError::UnsupportedIndicator {
            name: format!("{}({})", name, join_params(params)),
            reason,
        };
        let period = |i: usize| -> Result<usize, TradesimError> {
            let p = params[i];
            if p.is_finite() && p >= 1.0 && p.fract() == 0.0 {
                Ok(p as usize)
            } else {
                Err(unsupported(format!(
                    "parameter {} must be a positive integer, got {}",
                    i + 1,
                    p
                )))
            }
        };
        let arity = |expected: &[usize]| -> Result<(), TradesimError> {
            if expected.contains(&params.len()) {
                Ok(())
            } else {
                Err(unsupported(format!(
                    "expected {} parameter(s), got {}",
                    expected
                        .iter()
                        .map(|n| n.to_string())
                        .collect::<Vec<_>>()
                        .join(" or "),
                    params.len()
                )))
            }
        };

        let resolved = match name {
            "SMA" | "EMA" | "WMA" | "RSI" | "ROC" | "STDDEV" => {
                arity(&[1])?;
                let p = period(0)?;
                let op = match name {
                    "SMA" => IndicatorOp::Sma(p),
                    "EMA" => IndicatorOp::Ema(p),
                    "WMA" => IndicatorOp::Wma(p),
                    "RSI" => IndicatorOp::Rsi(p),
                    "ROC" => IndicatorOp::Roc(p),
                    _ => IndicatorOp::StdDev(p),
                };
                (op, IndicatorField::Value)
            }
            "MACD" | "MACD_SIGNAL" | "MACD_HIST" => {
                arity(&[3])?;
                let op = IndicatorOp::Macd {
                    fast: period(0)?,
                    slow: period(1)?,
                    signal: period(2)?,
                };
                let field = match name {
                    "MACD" => IndicatorField::MacdLine,
                    "MACD_SIGNAL" => IndicatorField::MacdSignal,
                    _ => IndicatorField::MacdHist,
                };
                (op, field)
            }
            "BB_UPPER" | "BB_MIDDLE" | "BB_LOWER" => {
                arity(&[1, 2])?;
                let p = period(0)?;
                let dev = params.get(1).copied().unwrap_or(DEFAULT_BB_DEVIATION);
                if !(dev.is_finite() && dev >= 0.0) {
                    return Err(unsupported(format!(
                        "band deviation must be non-negative, got {}",
                        dev
                    )));
                }
                let field = match name {
                    "BB_UPPER" => IndicatorField::BbUpper,
                    "BB_MIDDLE" => IndicatorField::BbMiddle,
                    _ => IndicatorField::BbLower,
                };
                (IndicatorOp::bbands(p, dev, dev), field)
            }
            _ => return Err(unsupported("unknown indicator".to_string())),
        };
        Ok(resolved)
    }
}

impl IndicatorField {
    /// Index of this field within the outputs of `op`.
    pub fn output_index(&self, op: &IndicatorOp) -> Result<usize, TradesimError> {
        let index = match (self, op) {
            (IndicatorField::Value, IndicatorOp::Macd { .. })
            | (IndicatorField::Value, IndicatorOp::Bbands { .. }) => None,
            (IndicatorField::Value, _) => Some(0),
            (IndicatorField::MacdLine, IndicatorOp::Macd { .. }) => Some(0),
            (IndicatorField::MacdSignal, IndicatorOp::Macd { .. }) => Some(1),
            (IndicatorField::MacdHist, IndicatorOp::Macd { .. }) => Some(2),
            (IndicatorField::BbUpper, IndicatorOp::Bbands { .. }) => Some(0),
            (IndicatorField::BbMiddle, IndicatorOp::Bbands { .. }) => Some(1),
            (IndicatorField::BbLower, IndicatorOp::Bbands { .. }) => Some(2),
            _ => None,
        };
        index.ok_or_else(|| TradesimError::UnsupportedIndicator {
            name: op.to_string(),
            reason: format!("no {:?} output", self),
        })
    }
}

fn deviation_to_x100(dev: f64) -> u32 {
    if dev.is_finite() && dev > 0.0 {
        (dev * 100.0).round() as u32
    } else {
        0
    }
}

fn join_params(params: &[f64]) -> String {
    params
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for IndicatorOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorOp::Sma(period) => write!(f, "SMA({})", period),
            IndicatorOp::Ema(period) => write!(f, "EMA({})", period),
            IndicatorOp::Wma(period) => write!(f, "WMA({})", period),
            IndicatorOp::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorOp::Roc(period) => write!(f, "ROC({})", period),
            IndicatorOp::StdDev(period) => write!(f, "STDDEV({})", period),
            IndicatorOp::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorOp::Bbands {
                period,
                dev_up_x100,
                dev_down_x100,
                ma,
            } => {
                let up = *dev_up_x100 as f64 / 100.0;
                let down = *dev_down_x100 as f64 / 100.0;
                match ma {
                    MaType::Sma => write!(f, "BBANDS({},{},{})", period, up, down),
                    MaType::Ema => write!(f, "BBANDS({},{},{},EMA)", period, up, down),
                }
            }
        }
    }
}

/// Built-in indicator-math library.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaCore;

impl IndicatorLibrary for TaCore {
    fn compute(&self, op: &IndicatorOp, input: &[f64]) -> Result<Vec<RawSeries>, TradesimError> {
        op.validate()?;
        let outputs = match *op {
            IndicatorOp::Sma(p) => vec![calculate_sma(input, p)],
            IndicatorOp::Ema(p) => vec![calculate_ema(input, p)],
            IndicatorOp::Wma(p) => vec![calculate_wma(input, p)],
            IndicatorOp::Rsi(p) => vec![calculate_rsi(input, p)],
            IndicatorOp::Roc(p) => vec![calculate_roc(input, p)],
            IndicatorOp::StdDev(p) => vec![calculate_stddev(input, p)],
            IndicatorOp::Macd { fast, slow, signal } => {
                Vec::from(calculate_macd(input, fast, slow, signal))
            }
            IndicatorOp::Bbands {
                period,
                dev_up_x100,
                dev_down_x100,
                ma,
            } => Vec::from(calculate_bollinger(
                input,
                period,
                dev_up_x100 as f64 / 100.0,
                dev_down_x100 as f64 / 100.0,
                ma,
            )),
        };
        Ok(outputs)
    }

    fn compute_pattern(
        &self,
        pattern: &PatternOp,
        input: &OhlcInput<'_>,
    ) -> Result<RawSeries, TradesimError> {
        input.check()?;
        Ok(pattern.calculate(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_op_display() {
        assert_eq!(IndicatorOp::Sma(20).to_string(), "SMA(20)");
        let macd = IndicatorOp::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD(12,26,9)");
        assert_eq!(
            IndicatorOp::bbands(20, 2.0, 1.5).to_string(),
            "BBANDS(20,2,1.5)"
        );
        assert_eq!(
            IndicatorOp::bbands_with(20, 2.0, 2.0, MaType::Ema).to_string(),
            "BBANDS(20,2,2,EMA)"
        );
    }

    #[test]
    fn ma_type_names() {
        assert_eq!(MaType::from_name("EMA"), Some(MaType::Ema));
        assert_eq!(MaType::from_name(" sma "), Some(MaType::Sma));
        assert_eq!(MaType::from_name("wma"), None);
        assert_ne!(
            IndicatorOp::bbands(20, 2.0, 2.0),
            IndicatorOp::bbands_with(20, 2.0, 2.0, MaType::Ema)
        );
    }

    #[test]
    fn indicator_op_hash_eq() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(IndicatorOp::Sma(20), "sma20");
        map.insert(IndicatorOp::bbands(20, 2.0, 2.0), "bb");

        assert_eq!(map.get(&IndicatorOp::Sma(20)), Some(&"sma20"));
        assert_eq!(map.get(&IndicatorOp::bbands(20, 2.0, 2.0)), Some(&"bb"));
        assert_eq!(map.get(&IndicatorOp::Sma(50)), None);
    }

    #[test]
    fn resolve_single_period() {
        let (op, field) = IndicatorOp::from_expression("RSI", &[14.0]).unwrap();
        assert_eq!(op, IndicatorOp::Rsi(14));
        assert_eq!(field, IndicatorField::Value);
    }

    #[test]
    fn resolve_macd_fields() {
        let (op, field) = IndicatorOp::from_expression("MACD_HIST", &[12.0, 26.0, 9.0]).unwrap();
        assert_eq!(
            op,
            IndicatorOp::Macd {
                fast: 12,
                slow: 26,
                signal: 9
            }
        );
        assert_eq!(field, IndicatorField::MacdHist);
    }

    #[test]
    fn resolve_bollinger_default_deviation() {
        let (op, field) = IndicatorOp::from_expression("BB_LOWER", &[20.0]).unwrap();
        assert_eq!(op, IndicatorOp::bbands(20, 2.0, 2.0));
        assert_eq!(field, IndicatorField::BbLower);
    }

    #[test]
    fn resolve_rejects_unknown_name() {
        let err = IndicatorOp::from_expression("FOO", &[3.0]).unwrap_err();
        assert!(matches!(err, TradesimError::UnsupportedIndicator { name, .. } if name == "FOO(3)"));
    }

    #[test]
    fn resolve_rejects_fractional_period() {
        assert!(IndicatorOp::from_expression("SMA", &[2.5]).is_err());
        assert!(IndicatorOp::from_expression("SMA", &[0.0]).is_err());
        assert!(IndicatorOp::from_expression("SMA", &[-3.0]).is_err());
    }

    #[test]
    fn resolve_rejects_wrong_arity() {
        assert!(IndicatorOp::from_expression("EMA", &[]).is_err());
        assert!(IndicatorOp::from_expression("EMA", &[5.0, 6.0]).is_err());
        assert!(IndicatorOp::from_expression("MACD", &[12.0, 26.0]).is_err());
        assert!(IndicatorOp::from_expression("BB_UPPER", &[20.0, 2.0, 2.0]).is_err());
    }

    #[test]
    fn field_output_index() {
        let macd = IndicatorOp::Macd {
            fast: 3,
            slow: 5,
            signal: 2,
        };
        assert_eq!(IndicatorField::MacdSignal.output_index(&macd).unwrap(), 1);
        assert_eq!(IndicatorField::Value.output_index(&IndicatorOp::Ema(3)).unwrap(), 0);
        assert!(IndicatorField::Value.output_index(&macd).is_err());
        assert!(IndicatorField::BbUpper.output_index(&macd).is_err());
    }

    #[test]
    fn zero_period_is_rejected() {
        assert!(TaCore.compute(&IndicatorOp::Sma(0), &[1.0, 2.0]).is_err());
        let macd = IndicatorOp::Macd {
            fast: 0,
            slow: 26,
            signal: 9,
        };
        assert!(TaCore.compute(&macd, &[1.0]).is_err());
    }

    #[test]
    fn lookback_matches_begin_index() {
        let input: Vec<f64> = (0..80).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let ops = [
            IndicatorOp::Sma(10),
            IndicatorOp::Ema(10),
            IndicatorOp::Wma(10),
            IndicatorOp::Rsi(14),
            IndicatorOp::Roc(5),
            IndicatorOp::StdDev(7),
            IndicatorOp::bbands(20, 2.0, 2.0),
            IndicatorOp::bbands_with(20, 2.0, 2.0, MaType::Ema),
        ];
        for op in ops {
            let out = TaCore.compute(&op, &input).unwrap();
            assert_eq!(out[0].begin_index, op.lookback(), "{op}");
        }
        let macd = IndicatorOp::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        let out = TaCore.compute(&macd, &input).unwrap();
        assert_eq!(out[1].begin_index, macd.lookback());
    }
}

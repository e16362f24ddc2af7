//! Per-bar trading signal.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalKind {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Buy => write!(f, "BUY"),
            SignalKind::Sell => write!(f, "SELL"),
            SignalKind::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub confidence: f64,
}

impl Signal {
    /// Confidence is clamped into [0, 1]; NaN becomes 0.
    pub fn new(kind: SignalKind, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Signal { kind, confidence }
    }

    pub fn buy(confidence: f64) -> Self {
        Signal::new(SignalKind::Buy, confidence)
    }

    pub fn sell(confidence: f64) -> Self {
        Signal::new(SignalKind::Sell, confidence)
    }

    pub fn hold() -> Self {
        Signal::new(SignalKind::Hold, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_clamped() {
        assert!((Signal::buy(1.7).confidence - 1.0).abs() < f64::EPSILON);
        assert!((Signal::sell(-0.3).confidence - 0.0).abs() < f64::EPSILON);
        assert!((Signal::buy(f64::NAN).confidence - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn kind_display() {
        assert_eq!(SignalKind::Buy.to_string(), "BUY");
        assert_eq!(SignalKind::Sell.to_string(), "SELL");
        assert_eq!(SignalKind::Hold.to_string(), "HOLD");
    }

    #[test]
    fn hold_has_zero_confidence() {
        let s = Signal::hold();
        assert_eq!(s.kind, SignalKind::Hold);
        assert!((s.confidence - 0.0).abs() < f64::EPSILON);
    }
}

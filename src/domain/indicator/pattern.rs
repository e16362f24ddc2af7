//! Candlestick patterns.
//!
//! "Long", "short" and "near" are relative: a bar's body or range is compared
//! with the average of the same measure over the bars just before it.
//! Scores are +100 (bullish), -100 (bearish) or 0. The first scored bar is
//! [`PatternOp::lookback`].

use std::fmt;

use crate::ports::indicator_port::{OhlcInput, RawSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternOp {
    /// Second body engulfs the first, opposite colours.
    Engulfing,
    /// Long black, gapped-down short body, then a white bar closing at least
    /// `penetration` of the way into the first body.
    MorningStar { penetration_x100: u32 },
    /// Small body at the top of the range with a long lower shadow.
    Hammer,
}

#[derive(Debug, Clone, Copy)]
enum RangeKind {
    RealBody,
    HighLow,
}

#[derive(Debug, Clone, Copy)]
struct Setting {
    kind: RangeKind,
    /// Bars averaged before the current one; 0 means the current bar itself.
    period: usize,
    factor: f64,
}

const BODY_LONG: Setting = Setting {
    kind: RangeKind::RealBody,
    period: 10,
    factor: 1.0,
};
const BODY_SHORT: Setting = Setting {
    kind: RangeKind::RealBody,
    period: 10,
    factor: 1.0,
};
const SHADOW_LONG: Setting = Setting {
    kind: RangeKind::RealBody,
    period: 0,
    factor: 1.0,
};
const SHADOW_VERY_SHORT: Setting = Setting {
    kind: RangeKind::HighLow,
    period: 10,
    factor: 0.1,
};
const NEAR: Setting = Setting {
    kind: RangeKind::HighLow,
    period: 5,
    factor: 0.2,
};

struct Bars<'a> {
    input: &'a OhlcInput<'a>,
}

impl Bars<'_> {
    fn real_body(&self, i: usize) -> f64 {
        (self.input.close[i] - self.input.open[i]).abs()
    }

    fn body_top(&self, i: usize) -> f64 {
        self.input.close[i].max(self.input.open[i])
    }

    fn body_bottom(&self, i: usize) -> f64 {
        self.input.close[i].min(self.input.open[i])
    }

    fn upper_shadow(&self, i: usize) -> f64 {
        self.input.high[i] - self.body_top(i)
    }

    fn lower_shadow(&self, i: usize) -> f64 {
        self.body_bottom(i) - self.input.low[i]
    }

    /// +1 for a white (rising) bar, -1 for black.
    fn color(&self, i: usize) -> i8 {
        if self.input.close[i] >= self.input.open[i] {
            1
        } else {
            -1
        }
    }

    fn measure(&self, kind: RangeKind, i: usize) -> f64 {
        match kind {
            RangeKind::RealBody => self.real_body(i),
            RangeKind::HighLow => self.input.high[i] - self.input.low[i],
        }
    }

    /// Requires `i >= setting.period`.
    fn average(&self, setting: Setting, i: usize) -> f64 {
        let base = if setting.period == 0 {
            self.measure(setting.kind, i)
        } else {
            (i - setting.period..i)
                .map(|j| self.measure(setting.kind, j))
                .sum::<f64>()
                / setting.period as f64
        };
        setting.factor * base
    }

    fn engulfing(&self, i: usize) -> f64 {
        let (o, c) = (self.input.open, self.input.close);
        let bullish = self.color(i) == 1
            && self.color(i - 1) == -1
            && c[i] > o[i - 1]
            && o[i] < c[i - 1];
        let bearish = self.color(i) == -1
            && self.color(i - 1) == 1
            && o[i] > c[i - 1]
            && c[i] < o[i - 1];
        if bullish || bearish {
            f64::from(self.color(i)) * 100.0
        } else {
            0.0
        }
    }

    fn morning_star(&self, i: usize, penetration: f64) -> f64 {
        let c = self.input.close;
        let first_long_black =
            self.real_body(i - 2) > self.average(BODY_LONG, i - 2) && self.color(i - 2) == -1;
        let star_gaps_down = self.real_body(i - 1) <= self.average(BODY_SHORT, i - 1)
            && self.body_top(i - 1) < self.body_bottom(i - 2);
        let third_rallies = self.real_body(i) > self.average(BODY_SHORT, i)
            && self.color(i) == 1
            && c[i] > c[i - 2] + self.real_body(i - 2) * penetration;
        if first_long_black && star_gaps_down && third_rallies {
            100.0
        } else {
            0.0
        }
    }

    fn hammer(&self, i: usize) -> f64 {
        let small_body = self.real_body(i) < self.average(BODY_SHORT, i);
        let long_lower = self.lower_shadow(i) > self.average(SHADOW_LONG, i);
        let tiny_upper = self.upper_shadow(i) < self.average(SHADOW_VERY_SHORT, i);
        let near_prior_low =
            self.body_bottom(i) <= self.input.low[i - 1] + self.average(NEAR, i - 1);
        if small_body && long_lower && tiny_upper && near_prior_low {
            100.0
        } else {
            0.0
        }
    }
}

impl PatternOp {
    pub fn morning_star(penetration: f64) -> Self {
        let penetration_x100 = if penetration.is_finite() && penetration > 0.0 {
            (penetration * 100.0).round() as u32
        } else {
            0
        };
        PatternOp::MorningStar { penetration_x100 }
    }

    /// First input index that receives a score.
    pub fn lookback(&self) -> usize {
        match self {
            PatternOp::Engulfing => 2,
            PatternOp::MorningStar { .. } => BODY_SHORT.period.max(BODY_LONG.period) + 2,
            PatternOp::Hammer => {
                BODY_SHORT
                    .period
                    .max(SHADOW_LONG.period)
                    .max(SHADOW_VERY_SHORT.period)
                    .max(NEAR.period)
                    + 1
            }
        }
    }

    /// Score every bar from the lookback on. Channels must share one length.
    pub fn calculate(&self, input: &OhlcInput<'_>) -> RawSeries {
        let begin_index = self.lookback();
        if input.len() <= begin_index {
            return RawSeries::empty(input.len());
        }
        let bars = Bars { input };
        let values = (begin_index..input.len())
            .map(|i| match *self {
                PatternOp::Engulfing => bars.engulfing(i),
                PatternOp::MorningStar { penetration_x100 } => {
                    bars.morning_star(i, penetration_x100 as f64 / 100.0)
                }
                PatternOp::Hammer => bars.hammer(i),
            })
            .collect();
        RawSeries {
            begin_index,
            values,
        }
    }
}

impl fmt::Display for PatternOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternOp::Engulfing => write!(f, "CDL_ENGULFING"),
            PatternOp::MorningStar { penetration_x100 } => {
                write!(f, "CDL_MORNINGSTAR({})", *penetration_x100 as f64 / 100.0)
            }
            PatternOp::Hammer => write!(f, "CDL_HAMMER"),
        }
    }
}

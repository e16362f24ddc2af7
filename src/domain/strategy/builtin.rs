//! Fixed-parameter built-in strategies.

use tracing::debug;

use super::StrategyEvaluator;
use crate::domain::consensus::{tally, ConsensusConfig, VoteInputs, MA_CROSS_VOTES};
use crate::domain::history::History;
use crate::domain::indicator::{IndicatorField, IndicatorOp, PatternOp};
use crate::domain::indicator_adapter::IndicatorAdapter;
use crate::domain::signal::{Signal, SignalKind};

/// Read an indicator output, treating adapter errors as undefined.
fn read(
    history: &History<'_>,
    adapter: &IndicatorAdapter,
    op: &IndicatorOp,
    field: IndicatorField,
    back: usize,
) -> Option<f64> {
    match history.indicator(adapter, op, field, back) {
        Ok(value) => value,
        Err(e) => {
            debug!(indicator = %op, error = %e, "indicator unavailable");
            None
        }
    }
}

/// EMA fast/slow crossover. BUY when fast moves above slow, SELL when it drops
/// back to or below it.
#[derive(Debug, Clone)]
pub struct EmaCrossover {
    pub fast: usize,
    pub slow: usize,
    adapter: IndicatorAdapter,
}

impl EmaCrossover {
    pub const NAME: &'static str = "ema-crossover";

    pub fn new(fast: usize, slow: usize, adapter: IndicatorAdapter) -> Self {
        Self {
            fast,
            slow,
            adapter,
        }
    }
}

impl StrategyEvaluator for EmaCrossover {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(&self, history: &History<'_>) -> Signal {
        let fast = IndicatorOp::Ema(self.fast);
        let slow = IndicatorOp::Ema(self.slow);
        let at = |op: &IndicatorOp, back| read(history, &self.adapter, op, IndicatorField::Value, back);

        let (Some(prev_fast), Some(prev_slow), Some(cur_fast), Some(cur_slow)) =
            (at(&fast, 1), at(&slow, 1), at(&fast, 0), at(&slow, 0))
        else {
            return Signal::hold();
        };

        let prev_above = prev_fast > prev_slow;
        let cur_above = cur_fast > cur_slow;
        match (prev_above, cur_above) {
            (false, true) => Signal::buy(1.0),
            (true, false) => Signal::sell(1.0),
            _ => Signal::hold(),
        }
    }
}

/// RSI below the oversold level buys, above the overbought level sells.
#[derive(Debug, Clone)]
pub struct RsiMeanReversion {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
    adapter: IndicatorAdapter,
}

impl RsiMeanReversion {
    pub const NAME: &'static str = "rsi-mean-reversion";
    pub const CONFIDENCE: f64 = 0.8;

    pub fn new(period: usize, oversold: f64, overbought: f64, adapter: IndicatorAdapter) -> Self {
        Self {
            period,
            oversold,
            overbought,
            adapter,
        }
    }
}

impl StrategyEvaluator for RsiMeanReversion {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(&self, history: &History<'_>) -> Signal {
        let op = IndicatorOp::Rsi(self.period);
        match read(history, &self.adapter, &op, IndicatorField::Value, 0) {
            Some(rsi) if rsi < self.oversold => Signal::buy(Self::CONFIDENCE),
            Some(rsi) if rsi > self.overbought => Signal::sell(Self::CONFIDENCE),
            _ => Signal::hold(),
        }
    }
}

/// MACD histogram crossing zero.
#[derive(Debug, Clone)]
pub struct MacdTrend {
    pub op: IndicatorOp,
    adapter: IndicatorAdapter,
}

impl MacdTrend {
    pub const NAME: &'static str = "macd-trend";
    pub const CONFIDENCE: f64 = 0.9;

    pub fn new(fast: usize, slow: usize, signal: usize, adapter: IndicatorAdapter) -> Self {
        Self {
            op: IndicatorOp::Macd { fast, slow, signal },
            adapter,
        }
    }
}

impl StrategyEvaluator for MacdTrend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(&self, history: &History<'_>) -> Signal {
        let hist = |back| read(history, &self.adapter, &self.op, IndicatorField::MacdHist, back);
        let (Some(prev), Some(cur)) = (hist(1), hist(0)) else {
            return Signal::hold();
        };

        if prev <= 0.0 && cur > 0.0 {
            Signal::buy(Self::CONFIDENCE)
        } else if prev >= 0.0 && cur < 0.0 {
            Signal::sell(Self::CONFIDENCE)
        } else {
            Signal::hold()
        }
    }
}

/// Reversal candles. Bullish engulfing, morning star or hammer buys; bearish
/// engulfing sells.
#[derive(Debug, Clone)]
pub struct CandlestickPatterns {
    pub morning_star: PatternOp,
    adapter: IndicatorAdapter,
}

impl CandlestickPatterns {
    pub const NAME: &'static str = "candlestick";
    pub const CONFIDENCE: f64 = 0.7;
    pub const MIN_BARS: usize = 5;
    pub const MORNING_STAR_PENETRATION: f64 = 0.5;

    pub fn new(adapter: IndicatorAdapter) -> Self {
        Self {
            morning_star: PatternOp::morning_star(Self::MORNING_STAR_PENETRATION),
            adapter,
        }
    }

    fn score(&self, history: &History<'_>, pattern: &PatternOp) -> f64 {
        match history.pattern(&self.adapter, pattern) {
            Ok(value) => value.unwrap_or(0.0),
            Err(e) => {
                debug!(pattern = %pattern, error = %e, "pattern unavailable");
                0.0
            }
        }
    }
}

impl StrategyEvaluator for CandlestickPatterns {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(&self, history: &History<'_>) -> Signal {
        if history.len() < Self::MIN_BARS {
            return Signal::hold();
        }
        let engulfing = self.score(history, &PatternOp::Engulfing);
        let bullish = engulfing > 0.0
            || self.score(history, &self.morning_star) > 0.0
            || self.score(history, &PatternOp::Hammer) > 0.0;
        if bullish {
            Signal::buy(Self::CONFIDENCE)
        } else if engulfing < 0.0 {
            Signal::sell(Self::CONFIDENCE)
        } else {
            Signal::hold()
        }
    }
}

/// Bar-at-a-time version of the consensus vote.
#[derive(Debug, Clone)]
pub struct ConsensusStrategy {
    config: ConsensusConfig,
    adapter: IndicatorAdapter,
}

impl ConsensusStrategy {
    pub const NAME: &'static str = "consensus";
    /// Most votes one side can collect on a single bar.
    pub const MAX_VOTES: u32 = MA_CROSS_VOTES + 3;

    pub fn new(config: ConsensusConfig, adapter: IndicatorAdapter) -> Self {
        Self { config, adapter }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    fn vote_inputs(&self, history: &History<'_>) -> VoteInputs {
        let at = |op: &IndicatorOp, field, back| read(history, &self.adapter, op, field, back);
        let fast = self.config.fast_ma_op();
        let slow = self.config.slow_ma_op();
        let macd = self.config.macd_op();
        let bands = self.config.bbands_op();
        VoteInputs {
            close: history.current().map(|c| c.close).unwrap_or(f64::NAN),
            fast_ma: at(&fast, IndicatorField::Value, 0),
            slow_ma: at(&slow, IndicatorField::Value, 0),
            prev_fast_ma: at(&fast, IndicatorField::Value, 1),
            prev_slow_ma: at(&slow, IndicatorField::Value, 1),
            rsi: at(&self.config.rsi_op(), IndicatorField::Value, 0),
            macd: at(&macd, IndicatorField::MacdLine, 0),
            macd_signal: at(&macd, IndicatorField::MacdSignal, 0),
            prev_macd: at(&macd, IndicatorField::MacdLine, 1),
            prev_macd_signal: at(&macd, IndicatorField::MacdSignal, 1),
            bb_upper: at(&bands, IndicatorField::BbUpper, 0),
            bb_lower: at(&bands, IndicatorField::BbLower, 0),
        }
    }
}

impl StrategyEvaluator for ConsensusStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(&self, history: &History<'_>) -> Signal {
        if history.is_empty() || history.cursor() < self.config.warmup() {
            return Signal::hold();
        }
        let votes = tally(&self.vote_inputs(history), &self.config);
        let max = Self::MAX_VOTES as f64;
        match votes.decision() {
            SignalKind::Buy => Signal::buy(votes.buy as f64 / max),
            SignalKind::Sell => Signal::sell(votes.sell as f64 / max),
            SignalKind::Hold => Signal::hold(),
        }
    }
}

//! Multi-indicator consensus vote.
//!
//! Per bar at or after warm-up:
//! - fast MA crossing slow MA: 2 votes
//! - RSI beyond oversold/overbought: 1 vote
//! - close outside the Bollinger bands (EMA middle by default): 1 vote
//! - MACD line crossing its signal: 1 vote
//!
//! BUY needs more buy than sell votes and at least 2 buy votes; SELL mirrors
//! that. Everything else, including ties, is HOLD.
//!
//! [`ConsensusVoter`] evaluates a whole series in one pass; the per-bar
//! strategy in [`crate::domain::strategy::builtin`] feeds the same [`tally`].

use serde::{Deserialize, Serialize};

use crate::domain::aligned::AlignedSeries;
use crate::domain::error::TradesimError;
use crate::domain::indicator::{IndicatorOp, MaType};
use crate::domain::indicator_adapter::IndicatorAdapter;
use crate::domain::signal::SignalKind;

pub const MA_CROSS_VOTES: u32 = 2;
pub const MIN_DECISIVE_VOTES: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusConfig {
    pub fast_ma: usize,
    pub slow_ma: usize,
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bb_period: usize,
    pub bb_dev_up: f64,
    pub bb_dev_down: f64,
    pub bb_ma: MaType,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        ConsensusConfig {
            fast_ma: 50,
            slow_ma: 200,
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bb_period: 20,
            bb_dev_up: 2.0,
            bb_dev_down: 2.0,
            bb_ma: MaType::Ema,
        }
    }
}

impl ConsensusConfig {
    /// First bar that receives a vote.
    pub fn warmup(&self) -> usize {
        self.slow_ma.max(self.macd_slow + self.macd_signal)
    }

    pub fn fast_ma_op(&self) -> IndicatorOp {
        IndicatorOp::Sma(self.fast_ma)
    }

    pub fn slow_ma_op(&self) -> IndicatorOp {
        IndicatorOp::Sma(self.slow_ma)
    }

    pub fn rsi_op(&self) -> IndicatorOp {
        IndicatorOp::Rsi(self.rsi_period)
    }

    pub fn macd_op(&self) -> IndicatorOp {
        IndicatorOp::Macd {
            fast: self.macd_fast,
            slow: self.macd_slow,
            signal: self.macd_signal,
        }
    }

    pub fn bbands_op(&self) -> IndicatorOp {
        IndicatorOp::bbands_with(self.bb_period, self.bb_dev_up, self.bb_dev_down, self.bb_ma)
    }

    pub fn fast_label(&self) -> String {
        format!("SMA{}", self.fast_ma)
    }

    pub fn slow_label(&self) -> String {
        format!("SMA{}", self.slow_ma)
    }

    pub fn rsi_label(&self) -> String {
        format!("RSI{}", self.rsi_period)
    }
}

/// Indicator readings for one bar and the bar before it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VoteInputs {
    pub close: f64,
    pub fast_ma: Option<f64>,
    pub slow_ma: Option<f64>,
    pub prev_fast_ma: Option<f64>,
    pub prev_slow_ma: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub prev_macd: Option<f64>,
    pub prev_macd_signal: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub buy: u32,
    pub sell: u32,
}

impl VoteTally {
    pub fn decision(&self) -> SignalKind {
        if self.buy > self.sell && self.buy >= MIN_DECISIVE_VOTES {
            SignalKind::Buy
        } else if self.sell > self.buy && self.sell >= MIN_DECISIVE_VOTES {
            SignalKind::Sell
        } else {
            SignalKind::Hold
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cross {
    Above,
    Below,
}

fn crossing(
    prev_a: Option<f64>,
    prev_b: Option<f64>,
    a: Option<f64>,
    b: Option<f64>,
) -> Option<Cross> {
    let (pa, pb, a, b) = (prev_a?, prev_b?, a?, b?);
    if pa <= pb && a > b {
        Some(Cross::Above)
    } else if pa >= pb && a < b {
        Some(Cross::Below)
    } else {
        None
    }
}

pub fn tally(inputs: &VoteInputs, config: &ConsensusConfig) -> VoteTally {
    let mut votes = VoteTally::default();

    match crossing(
        inputs.prev_macd,
        inputs.prev_macd_signal,
        inputs.macd,
        inputs.macd_signal,
    ) {
        Some(Cross::Above) => votes.buy += 1,
        Some(Cross::Below) => votes.sell += 1,
        None => {}
    }

    if let Some(rsi) = inputs.rsi {
        if rsi < config.rsi_oversold {
            votes.buy += 1;
        } else if rsi > config.rsi_overbought {
            votes.sell += 1;
        }
    }

    if let (Some(upper), Some(lower)) = (inputs.bb_upper, inputs.bb_lower) {
        if inputs.close < lower {
            votes.buy += 1;
        } else if inputs.close > upper {
            votes.sell += 1;
        }
    }

    match crossing(
        inputs.prev_fast_ma,
        inputs.prev_slow_ma,
        inputs.fast_ma,
        inputs.slow_ma,
    ) {
        Some(Cross::Above) => votes.buy += MA_CROSS_VOTES,
        Some(Cross::Below) => votes.sell += MA_CROSS_VOTES,
        None => {}
    }

    votes
}

/// Whole-series indicator outputs and the per-bar decisions derived from them.
#[derive(Debug, Clone)]
pub struct ConsensusAnalysis {
    pub close: Vec<f64>,
    pub fast_ma: AlignedSeries,
    pub slow_ma: AlignedSeries,
    pub rsi: AlignedSeries,
    pub macd: AlignedSeries,
    pub macd_signal: AlignedSeries,
    pub bb_upper: AlignedSeries,
    pub bb_lower: AlignedSeries,
    pub signals: Vec<SignalKind>,
}

impl ConsensusAnalysis {
    pub fn vote_inputs(&self, index: usize) -> VoteInputs {
        let prev = index.checked_sub(1);
        let at_prev = |s: &AlignedSeries| prev.and_then(|p| s.get(p));
        VoteInputs {
            close: self.close.get(index).copied().unwrap_or(f64::NAN),
            fast_ma: self.fast_ma.get(index),
            slow_ma: self.slow_ma.get(index),
            prev_fast_ma: at_prev(&self.fast_ma),
            prev_slow_ma: at_prev(&self.slow_ma),
            rsi: self.rsi.get(index),
            macd: self.macd.get(index),
            macd_signal: self.macd_signal.get(index),
            prev_macd: at_prev(&self.macd),
            prev_macd_signal: at_prev(&self.macd_signal),
            bb_upper: self.bb_upper.get(index),
            bb_lower: self.bb_lower.get(index),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsensusVoter {
    config: ConsensusConfig,
    adapter: IndicatorAdapter,
}

impl ConsensusVoter {
    pub fn new(config: ConsensusConfig, adapter: IndicatorAdapter) -> Self {
        Self { config, adapter }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Compute every indicator once over `close` and vote on each bar.
    pub fn analyze(&self, close: &[f64]) -> Result<ConsensusAnalysis, TradesimError> {
        let adapter = &self.adapter;
        let len = close.len();
        let fast_ma = nth(&adapter.compute(&self.config.fast_ma_op(), close)?, 0, len);
        let slow_ma = nth(&adapter.compute(&self.config.slow_ma_op(), close)?, 0, len);
        let rsi = nth(&adapter.compute(&self.config.rsi_op(), close)?, 0, len);

        let macd_outputs = adapter.compute(&self.config.macd_op(), close)?;
        let macd = nth(&macd_outputs, 0, len);
        let macd_signal = nth(&macd_outputs, 1, len);

        let bb_outputs = adapter.compute(&self.config.bbands_op(), close)?;
        let bb_upper = nth(&bb_outputs, 0, len);
        let bb_lower = nth(&bb_outputs, 2, len);

        let mut analysis = ConsensusAnalysis {
            close: close.to_vec(),
            fast_ma,
            slow_ma,
            rsi,
            macd,
            macd_signal,
            bb_upper,
            bb_lower,
            signals: vec![SignalKind::Hold; close.len()],
        };

        let warmup = self.config.warmup();
        for i in warmup..close.len() {
            analysis.signals[i] = tally(&analysis.vote_inputs(i), &self.config).decision();
        }

        Ok(analysis)
    }

    pub fn signals(&self, close: &[f64]) -> Result<Vec<SignalKind>, TradesimError> {
        Ok(self.analyze(close)?.signals)
    }
}

fn nth(outputs: &[AlignedSeries], index: usize, len: usize) -> AlignedSeries {
    outputs
        .get(index)
        .cloned()
        .unwrap_or_else(|| AlignedSeries::undefined(len))
}

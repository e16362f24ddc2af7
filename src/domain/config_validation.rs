//! Configuration validation.
//!
//! Missing keys fall back to their defaults; present keys must hold sane
//! values before any run starts.

use chrono::NaiveDate;

use crate::domain::backtest::{BacktestConfig, DEFAULT_INITIAL_CAPITAL, DEFAULT_WARMUP};
use crate::domain::consensus::ConsensusConfig;
use crate::domain::error::TradesimError;
use crate::domain::indicator::MaType;
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    read_backtest_config(config)?;
    read_date_range(config)?;
    Ok(())
}

pub fn validate_consensus_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    read_consensus_config(config).map(|_| ())
}

/// `[backtest] initial_capital` and `warmup`, validated.
pub fn read_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TradesimError> {
    let initial_capital = config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL);
    if !(initial_capital.is_finite() && initial_capital > 0.0) {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }

    let warmup = config.get_int("backtest", "warmup", DEFAULT_WARMUP as i64);
    if warmup < 0 {
        return Err(invalid("backtest", "warmup", "warmup must be non-negative"));
    }

    Ok(BacktestConfig {
        initial_capital,
        warmup: warmup as usize,
    })
}

/// Optional `[backtest] start_date` / `end_date`. When both are set the start
/// must come first.
pub fn read_date_range(
    config: &dyn ConfigPort,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), TradesimError> {
    let start = config.get_date("backtest", "start_date")?;
    let end = config.get_date("backtest", "end_date")?;
    if let (Some(s), Some(e)) = (start, end) {
        if s >= e {
            return Err(invalid(
                "backtest",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok((start, end))
}

/// `[consensus]` overrides on top of the defaults, validated.
pub fn read_consensus_config(config: &dyn ConfigPort) -> Result<ConsensusConfig, TradesimError> {
    let defaults = ConsensusConfig::default();
    let consensus = ConsensusConfig {
        fast_ma: read_period(config, "fast_ma", defaults.fast_ma)?,
        slow_ma: read_period(config, "slow_ma", defaults.slow_ma)?,
        rsi_period: read_period(config, "rsi_period", defaults.rsi_period)?,
        rsi_overbought: config.get_double("consensus", "rsi_overbought", defaults.rsi_overbought),
        rsi_oversold: config.get_double("consensus", "rsi_oversold", defaults.rsi_oversold),
        macd_fast: read_period(config, "macd_fast", defaults.macd_fast)?,
        macd_slow: read_period(config, "macd_slow", defaults.macd_slow)?,
        macd_signal: read_period(config, "macd_signal", defaults.macd_signal)?,
        bb_period: read_period(config, "bb_period", defaults.bb_period)?,
        bb_dev_up: config.get_double("consensus", "bb_dev_up", defaults.bb_dev_up),
        bb_dev_down: config.get_double("consensus", "bb_dev_down", defaults.bb_dev_down),
        bb_ma: read_ma_type(config, defaults.bb_ma)?,
    };
    check_consensus_config(&consensus)?;
    Ok(consensus)
}

/// Cross-field rules for a consensus configuration from any source.
pub fn check_consensus_config(c: &ConsensusConfig) -> Result<(), TradesimError> {
    for (key, period) in [
        ("fast_ma", c.fast_ma),
        ("slow_ma", c.slow_ma),
        ("rsi_period", c.rsi_period),
        ("macd_fast", c.macd_fast),
        ("macd_slow", c.macd_slow),
        ("macd_signal", c.macd_signal),
        ("bb_period", c.bb_period),
    ] {
        if period == 0 {
            return Err(invalid("consensus", key, &format!("{key} must be at least 1")));
        }
    }

    if c.fast_ma >= c.slow_ma {
        return Err(invalid(
            "consensus",
            "fast_ma",
            "fast_ma must be less than slow_ma",
        ));
    }
    if c.macd_fast >= c.macd_slow {
        return Err(invalid(
            "consensus",
            "macd_fast",
            "macd_fast must be less than macd_slow",
        ));
    }

    let in_range = |v: f64| (0.0..=100.0).contains(&v);
    if !in_range(c.rsi_oversold) || !in_range(c.rsi_overbought) {
        return Err(invalid(
            "consensus",
            "rsi_oversold",
            "RSI thresholds must be between 0 and 100",
        ));
    }
    if c.rsi_oversold >= c.rsi_overbought {
        return Err(invalid(
            "consensus",
            "rsi_oversold",
            "rsi_oversold must be below rsi_overbought",
        ));
    }

    for (key, dev) in [("bb_dev_up", c.bb_dev_up), ("bb_dev_down", c.bb_dev_down)] {
        if !(dev.is_finite() && dev >= 0.0) {
            return Err(invalid("consensus", key, &format!("{key} must be non-negative")));
        }
    }

    Ok(())
}

fn read_period(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, TradesimError> {
    let value = config.get_int("consensus", key, default as i64);
    if value < 1 {
        return Err(invalid("consensus", key, &format!("{key} must be at least 1")));
    }
    Ok(value as usize)
}

fn read_ma_type(config: &dyn ConfigPort, default: MaType) -> Result<MaType, TradesimError> {
    match config.get_string("consensus", "bb_ma_type") {
        None => Ok(default),
        Some(name) => MaType::from_name(&name).ok_or_else(|| {
            invalid("consensus", "bb_ma_type", "bb_ma_type must be SMA or EMA")
        }),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> TradesimError {
    TradesimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

//! Domain error types.

/// A DSL compilation error with the 1-based source line it came from.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {line_number}: {reason}: '{line}'")]
pub struct DefinitionError {
    pub line_number: usize,
    pub line: String,
    pub reason: String,
}

impl DefinitionError {
    /// Format the error with a gutter showing the offending source line.
    pub fn display_with_context(&self) -> String {
        let gutter = format!("{} | ", self.line_number);
        let caret = " ".repeat(gutter.len()) + &"^".repeat(self.line.len().max(1));
        format!("{gutter}{line}\n{caret}\n{err}", line = self.line, err = self.reason)
    }
}

/// Top-level error type for tradesim.
#[derive(Debug, thiserror::Error)]
pub enum TradesimError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid strategy definition at {0}")]
    InvalidStrategyDefinition(#[from] DefinitionError),

    #[error("unknown strategy '{name}'")]
    UnknownStrategy { name: String },

    #[error("unsupported indicator {name}: {reason}")]
    UnsupportedIndicator { name: String, reason: String },

    #[error("malformed price data: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data: have {bars} bars, need more than {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("backtest cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradesimError> for std::process::ExitCode {
    fn from(err: &TradesimError) -> Self {
        let code: u8 = match err {
            TradesimError::Io(_) => 1,
            TradesimError::ConfigParse { .. }
            | TradesimError::ConfigMissing { .. }
            | TradesimError::ConfigInvalid { .. } => 2,
            TradesimError::Data { .. } => 3,
            TradesimError::InvalidStrategyDefinition(_)
            | TradesimError::UnknownStrategy { .. }
            | TradesimError::UnsupportedIndicator { .. } => 4,
            TradesimError::NoData { .. } | TradesimError::InsufficientData { .. } => 5,
            TradesimError::Cancelled => 6,
        };
        std::process::ExitCode::from(code)
    }
}

//! Domain error types.

/// Top-level error type for signalcast.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no data for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("insufficient history for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientHistory {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("invalid symbol '{symbol}': {reason}")]
    InvalidSymbol { symbol: String, reason: String },

    #[error("invalid simulation request: {reason}")]
    Simulation { reason: String },

    #[error("every symbol in the batch failed ({attempted} attempted)")]
    AllSymbolsFailed { attempted: usize },

    #[error("refresh aborted: {reason}")]
    RefreshAborted { reason: String },

    #[error("storage error: {reason}")]
    Storage { reason: String },

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

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn data_unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        EngineError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_config(section: &str, key: &str, reason: impl Into<String>) -> Self {
        EngineError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&EngineError> for std::process::ExitCode {
    fn from(err: &EngineError) -> Self {
        let code: u8 = match err {
            EngineError::Io(_)
            | EngineError::Storage { .. }
            | EngineError::Json(_)
            | EngineError::RefreshAborted { .. } => 1,
            EngineError::ConfigParse { .. }
            | EngineError::ConfigMissing { .. }
            | EngineError::ConfigInvalid { .. } => 2,
            EngineError::InvalidSymbol { .. } | EngineError::Simulation { .. } => 4,
            EngineError::DataUnavailable { .. }
            | EngineError::InsufficientHistory { .. }
            | EngineError::AllSymbolsFailed { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

//! Domain error types.

/// Top-level error type for hindsight.
#[derive(Debug, thiserror::Error)]
pub enum HindsightError {
    #[error("invalid input: {reason}")]
    Validation { reason: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no price data for {symbol}")]
    NoData { symbol: String },

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

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HindsightError {
    pub fn validation(reason: impl Into<String>) -> Self {
        HindsightError::Validation {
            reason: reason.into(),
        }
    }
}

impl From<&HindsightError> for std::process::ExitCode {
    fn from(err: &HindsightError) -> Self {
        let code: u8 = match err {
            HindsightError::Io(_) | HindsightError::Report { .. } => 1,
            HindsightError::ConfigParse { .. }
            | HindsightError::ConfigMissing { .. }
            | HindsightError::ConfigInvalid { .. } => 2,
            HindsightError::DataSource { .. } => 3,
            HindsightError::NoData { .. } | HindsightError::Validation { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

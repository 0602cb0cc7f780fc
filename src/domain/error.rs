//! Domain error types.

/// Top-level error type for stratbench.
#[derive(Debug, thiserror::Error)]
pub enum StratbenchError {
    #[error("data error: {reason}")]
    Data { reason: String },

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

    #[error("invalid price series: {reason}")]
    InvalidSeries { reason: String },

    #[error("empty price series: {reason}")]
    EmptyInput { reason: String },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("unknown metric: {name}")]
    UnknownMetric { name: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("optimization failed: {reason}")]
    OptimizationFailed { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&StratbenchError> for std::process::ExitCode {
    fn from(err: &StratbenchError) -> Self {
        let code: u8 = match err {
            StratbenchError::Io(_) => 1,
            StratbenchError::ConfigParse { .. }
            | StratbenchError::ConfigMissing { .. }
            | StratbenchError::ConfigInvalid { .. } => 2,
            StratbenchError::Data { .. } => 3,
            StratbenchError::InvalidSeries { .. }
            | StratbenchError::InvalidParameter { .. }
            | StratbenchError::UnknownStrategy { .. }
            | StratbenchError::UnknownMetric { .. } => 4,
            StratbenchError::EmptyInput { .. } | StratbenchError::OptimizationFailed { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

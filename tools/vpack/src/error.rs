//! vpack error types

use thiserror::Error;

/// Result type for vpack operations
pub type Result<T> = std::result::Result<T, VpackError>;

#[derive(Debug, Error)]
pub enum VpackError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid value '{input}': {reason}")]
    InvalidValue { input: String, reason: String },

    #[error("Input of {size} bytes exceeds the {limit} byte limit")]
    InputTooLarge { size: u64, limit: u64 },

    #[error("Logging error: {0}")]
    Logging(String),
}

impl VpackError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid value error
    pub fn invalid_value(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

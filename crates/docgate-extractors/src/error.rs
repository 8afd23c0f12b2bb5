//! Extraction error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while running an extraction backend.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The caller supplied something the backend cannot process
    /// (empty payload, malformed document, out-of-range sheet, ...).
    #[error("{0}")]
    InvalidInput(String),

    /// The remote vendor failed or replied with something unusable.
    #[error("upstream service error: {0}")]
    Upstream(String),

    /// The unit of work did not finish within the configured budget.
    #[error("backend did not respond within {}s", .0.as_secs())]
    Timeout(Duration),

    /// Credentials or settings required by a backend are missing.
    #[error("backend is not configured: {0}")]
    Configuration(String),

    /// Anything else that went wrong inside the gateway itself.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the failure was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

impl From<reqwest::Error> for ExtractError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Upstream(format!("request timed out: {}", err))
        } else {
            Self::Upstream(err.to_string())
        }
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

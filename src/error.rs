//! Error types for the health check.

use thiserror::Error;

use crate::source::SourceError;

/// Result type alias for health check operations
pub type Result<T> = std::result::Result<T, HealthError>;

/// Errors that end a health check run
#[derive(Debug, Error)]
pub enum HealthError {
    /// The caller supplied unusable input, e.g. an empty service list
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Events could not be fetched (credentials, transport, or feed errors)
    #[error("event source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration loaded but holds an unusable value
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl HealthError {
    /// Returns true if the run failed because credentials are missing
    pub fn is_missing_credentials(&self) -> bool {
        matches!(
            self,
            HealthError::SourceUnavailable(SourceError::MissingCredentials)
        )
    }
}

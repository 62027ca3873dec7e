//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors delivered through request callbacks and delegates
#[derive(Debug, Clone, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error("{0}")]
    Domain(String),

    /// Request parameters were rejected before reaching the engine
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The engine failed to answer
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The authorization token was rejected or could not be obtained
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// The request was cancelled before it completed
    #[error("Request cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if the engine may succeed when asked again
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::ExternalService(_))
    }
}

impl From<DomainError> for ApplicationError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ValidationError(msg) | DomainError::InvalidCoordinate(msg) => {
                Self::Validation(msg)
            },
            other => Self::Domain(other.to_string()),
        }
    }
}

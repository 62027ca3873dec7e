//! Maps server API error types

use thiserror::Error;

/// Errors that can occur when talking to the maps server API
#[derive(Debug, Error)]
pub enum MapKitError {
    /// Connection to the maps service failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The service answered with an unexpected status
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The service rejected the request parameters
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Failed to parse the service response
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The authorization token or access token was rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimitExceeded {
        /// Seconds to wait before retrying (if provided by the API)
        retry_after_secs: Option<u64>,
    },

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Service is temporarily unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Request timeout
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout {
        /// The timeout duration in seconds
        timeout_secs: u64,
    },
}

impl MapKitError {
    /// Returns true if this error is retryable
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::RequestFailed(_)
                | Self::ServiceUnavailable(_)
                | Self::Timeout { .. }
                | Self::RateLimitExceeded { .. }
        )
    }
}

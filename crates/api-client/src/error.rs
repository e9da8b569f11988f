//! Error types for the API client
//!
//! These errors describe what went wrong below the envelope. Request methods
//! never return them directly: they are folded into
//! [`ApiResponse::Failure`](crate::envelope::ApiResponse) through
//! [`ApiError::envelope_message`]. Only client construction surfaces them.

use std::time::Duration;
use thiserror::Error;

/// Envelope error text for a request that exceeded its timeout
pub const TIMEOUT_MESSAGE: &str = "Request timeout";

/// Envelope error text for a failure that carries no message of its own
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error occurred";

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed at the transport level
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request timeout
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Header name or value could not be encoded
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Query parameters could not be flattened into key/value pairs
    #[error("Invalid query parameters: {0}")]
    InvalidQuery(String),
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid URL error
    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Self::InvalidUrl(msg.into())
    }

    /// Create an invalid header error
    pub fn invalid_header(msg: impl Into<String>) -> Self {
        Self::InvalidHeader(msg.into())
    }

    /// Whether this error means the request ran out of time
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Request(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Text placed in the `error` field of a failure envelope
    #[must_use]
    pub fn envelope_message(&self) -> String {
        if self.is_timeout() {
            return TIMEOUT_MESSAGE.to_string();
        }

        let message = match self {
            Self::Request(e) => e.to_string(),
            other => other.to_string(),
        };

        if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_envelope_message() {
        let err = ApiError::Timeout(Duration::from_millis(30_000));
        assert!(err.is_timeout());
        assert_eq!(err.envelope_message(), "Request timeout");
    }

    #[test]
    fn test_config_envelope_message_keeps_text() {
        let err = ApiError::config("base_url cannot be empty");
        assert!(!err.is_timeout());
        assert_eq!(
            err.envelope_message(),
            "Configuration error: base_url cannot be empty"
        );
    }

    #[test]
    fn test_json_error_converts() {
        let err: ApiError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, ApiError::Json(_)));
        assert!(err.envelope_message().starts_with("JSON error:"));
    }
}

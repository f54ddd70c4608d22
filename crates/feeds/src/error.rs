//! Error types for feed operations.

use thiserror::Error;

/// Errors that can occur while fetching quotes from an exchange.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Exchange API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Exchange not supported: {0}")]
    UnsupportedExchange(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(err.to_string())
        } else if err.is_decode() {
            FeedError::ParseError(err.to_string())
        } else {
            FeedError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::ParseError(err.to_string())
    }
}

impl FeedError {
    /// Returns true if this error is transient and the next cycle will
    /// likely succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FeedError::ConnectionFailed(_)
            | FeedError::Timeout(_)
            | FeedError::RateLimitExceeded => true,
            FeedError::Http { status, .. } => *status >= 500,
            FeedError::Api { .. }
            | FeedError::ParseError(_)
            | FeedError::UnsupportedExchange(_) => false,
        }
    }
}

//! Error types for the remote data sources

use std::fmt;

use crate::state::InvalidSample;

/// Result type alias for remote fetches
pub type FetchResult<T> = Result<T, FetchError>;

/// A transient failure of one of the remote sources.
///
/// None of these are fatal; the affected action is skipped for the
/// current cycle and retried on the next scheduled one.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read
    Request(String),

    /// The server answered with a non-2xx status
    Status(u16),

    /// The body did not have the expected shape
    Malformed(String),

    /// The body carried a value the monitor cannot accept
    InvalidValue(f64),

    /// No answer within the configured timeout
    Timeout,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Request(msg) => write!(f, "request failed: {}", msg),
            FetchError::Status(status) => write!(f, "unexpected HTTP status: {}", status),
            FetchError::Malformed(msg) => write!(f, "malformed response: {}", msg),
            FetchError::InvalidValue(value) => write!(f, "invalid metric value: {}", value),
            FetchError::Timeout => write!(f, "request timed out"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

impl From<InvalidSample> for FetchError {
    fn from(err: InvalidSample) -> Self {
        FetchError::InvalidValue(err.0)
    }
}

impl From<tokio::time::error::Elapsed> for FetchError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        FetchError::Timeout
    }
}

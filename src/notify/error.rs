//! Error types for notification delivery

use std::fmt;

/// Result type alias for notification delivery
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Errors that can occur while delivering a notification
#[derive(Debug, Clone, PartialEq)]
pub enum NotifyError {
    /// Sender or recipient address could not be parsed
    Address(String),

    /// The message could not be assembled
    Build(String),

    /// The transport rejected the message or could not be reached
    Transport(String),

    /// Delivery did not finish within the configured timeout
    Timeout,
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::Address(msg) => write!(f, "invalid address: {}", msg),
            NotifyError::Build(msg) => write!(f, "failed to build message: {}", msg),
            NotifyError::Transport(msg) => write!(f, "transport error: {}", msg),
            NotifyError::Timeout => write!(f, "delivery timed out"),
        }
    }
}

impl std::error::Error for NotifyError {}

impl From<lettre::address::AddressError> for NotifyError {
    fn from(err: lettre::address::AddressError) -> Self {
        NotifyError::Address(err.to_string())
    }
}

impl From<lettre::error::Error> for NotifyError {
    fn from(err: lettre::error::Error) -> Self {
        NotifyError::Build(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for NotifyError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        NotifyError::Transport(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for NotifyError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        NotifyError::Timeout
    }
}

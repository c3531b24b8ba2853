//! Downstream error types and the timeout predicate.

use thiserror::Error;

/// Errors that can occur when calling the downstream processor.
#[derive(Debug, Error)]
pub enum DownstreamError {
    /// The transport failed before a response was read.
    #[error("{message}")]
    Transport { message: String, timeout: bool },

    /// The processor answered with an empty body or an invalid status line.
    #[error("empty response or invalid status line (status {status_code})")]
    NoResponse { status_code: u16 },

    /// The response body could not be decoded into an outcome.
    #[error("{0}")]
    ResponseDecode(String),

    /// The request could not be serialized.
    #[error("could not encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl DownstreamError {
    /// Builds a transport error, classifying it as timeout-class when either
    /// the transport said so or the message matches the timeout predicate.
    pub fn transport(message: impl Into<String>, timed_out: bool) -> Self {
        let message = message.into();
        let timeout = timed_out || is_timeout_message(&message);
        DownstreamError::Transport { message, timeout }
    }

    /// Returns true if this failure should surface as `TIMEOUT`.
    pub fn is_timeout(&self) -> bool {
        match self {
            DownstreamError::Transport { timeout, .. } => *timeout,
            DownstreamError::NoResponse { .. } => true,
            DownstreamError::ResponseDecode(_) | DownstreamError::Encode(_) => false,
        }
    }
}

/// Returns true if the text describes a connect, read or socket timeout.
///
/// Matches "timeout", "time out" and "timed out", ignoring case.
pub fn is_timeout_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("timeout") || lower.contains("time out") || lower.contains("timed out")
}

/// Result type for downstream operations.
pub type Result<T> = std::result::Result<T, DownstreamError>;

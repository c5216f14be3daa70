//! Protocol-level failures of the dispatch loop.
//!
//! Command rejections are not errors at this layer: the gate turns them into
//! wire replies. These variants cover requests that never reach the gate and
//! failures of the connection itself.

use std::io;

use thiserror::Error;

/// Errors surfaced while reading requests or writing responses.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Request line is not valid JSON for a `CommandRequest`.
    #[error("malformed JSONL: {message}")]
    MalformedJsonl {
        /// Parser message.
        message: String,
        /// Underlying parser error.
        #[source]
        source: Option<serde_json::Error>,
    },
    /// Request line exceeded the size limit.
    #[error("request too large: {size} bytes exceeds {max_size} byte limit")]
    RequestTooLarge {
        /// Bytes read before giving up.
        size: usize,
        /// Configured limit.
        max_size: usize,
    },
    /// Reading from or writing to the client failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// A response could not be serialised.
    #[error("failed to serialize response: {0}")]
    SerializeResponse(#[from] serde_json::Error),
}

impl DispatchError {
    /// Wraps a request parse failure.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::MalformedJsonl {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Malformed request with a custom message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedJsonl {
            message: message.into(),
            source: None,
        }
    }

    /// Oversized request line.
    pub fn request_too_large(size: usize, max_size: usize) -> Self {
        Self::RequestTooLarge { size, max_size }
    }

    /// Whether the session must end after this error.
    ///
    /// Bad request lines are answered and the session continues. Oversized
    /// lines leave the stream mid-line, and IO failures leave nothing to
    /// talk to.
    pub fn terminates_session(&self) -> bool {
        match self {
            Self::MalformedJsonl { .. } => false,
            Self::RequestTooLarge { .. } | Self::Io(_) | Self::SerializeResponse(_) => true,
        }
    }
}

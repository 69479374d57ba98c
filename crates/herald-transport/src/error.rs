//! Transport error types.

use thiserror::Error;

/// Errors raised by the network front ends.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The listener could not bind its address.
    #[error("can't listen on {addr}: {reason}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Reason for failure.
        reason: String,
    },

    /// Building the HTTP client failed.
    #[error("can't build HTTP client: {0}")]
    Client(String),

    /// The HTTP request failed before a response arrived.
    #[error("request to {url} failed: {reason}")]
    Request {
        /// Requested URL.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Status code.
        status: u16,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Creates a request error.
    pub fn request(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Request {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

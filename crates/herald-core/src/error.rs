//! Unified error types for the Herald core.
//!
//! Every collaborator of the relay has its own error enum so the relay can
//! decide per category whether a failure is recoverable (logged, next event)
//! or fatal (propagated out of the loop).

use std::time::Duration;

use thiserror::Error;

// =============================================================================
// Platform Errors
// =============================================================================

/// Errors returned by a [`PlatformConnection`](crate::PlatformConnection).
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    /// The initial connection or handshake failed.
    #[error("platform handshake failed: {reason}")]
    Handshake {
        /// Reason for failure.
        reason: String,
    },

    /// The configured chat could not be resolved.
    #[error("can't resolve chat '{chat}': {reason}")]
    ChatNotFound {
        /// The chat reference as configured.
        chat: String,
        /// Reason for failure.
        reason: String,
    },

    /// Sending a message failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// Pinning a message failed.
    #[error("failed to pin message: {0}")]
    PinFailed(String),

    /// Restricting a user failed.
    #[error("failed to restrict user: {0}")]
    RestrictFailed(String),

    /// The platform answered, but not with success.
    #[error("platform rejected request: {0}")]
    Rejected(String),

    /// The outbound call did not complete in time.
    #[error("platform call timed out after {0:?}")]
    Timeout(Duration),
}

impl PlatformError {
    /// Creates a handshake error.
    pub fn handshake(reason: impl Into<String>) -> Self {
        Self::Handshake {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Event Transform Errors
// =============================================================================

/// Raised when a raw platform event can't be turned into an
/// [`InboundMessage`](crate::InboundMessage).
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    /// The event carries no chat context.
    #[error("event has no chat context")]
    MissingChat,

    /// The event is malformed.
    #[error("malformed event: {0}")]
    Malformed(String),
}

// =============================================================================
// Responder Errors
// =============================================================================

/// Failure inside a responder plugin.
///
/// The dispatcher treats every variant as "no match".
#[derive(Debug, Clone, Error)]
pub enum ResponderError {
    /// An upstream service could not be reached.
    #[error("upstream request to {url} failed: {reason}")]
    Upstream {
        /// Requested URL.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// An upstream service returned something we can't decode.
    #[error("malformed upstream payload: {0}")]
    Payload(String),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl ResponderError {
    /// Creates an upstream error.
    pub fn upstream(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Upstream {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a payload error.
    pub fn payload(reason: impl Into<String>) -> Self {
        Self::Payload(reason.into())
    }
}

impl From<serde_json::Error> for ResponderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Payload(err.to_string())
    }
}

// =============================================================================
// Bridge Errors
// =============================================================================

/// Errors returned by [`BridgeHandle::submit`](crate::BridgeHandle::submit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The submission was cancelled before it could be queued.
    #[error("submission cancelled")]
    Cancelled,

    /// The relay side of the bridge is gone.
    #[error("bridge closed")]
    Closed,
}

// =============================================================================
// Transcript Errors
// =============================================================================

/// Errors returned by a [`Transcript`](crate::Transcript) recorder.
#[derive(Debug, Clone, Error)]
pub enum TranscriptError {
    /// The recorder can't keep up.
    #[error("transcript backlog is full")]
    Backlog,

    /// The recorder has shut down.
    #[error("transcript recorder closed")]
    Closed,

    /// I/O error.
    #[error("transcript I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TranscriptError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Result type for responder plugins.
pub type ResponderResult<T> = Result<T, ResponderError>;

/// Result type for bridge submissions.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Result type for transcript operations.
pub type TranscriptResult<T> = Result<T, TranscriptError>;

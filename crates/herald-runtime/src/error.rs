//! Runtime error types.

use herald_core::PlatformError;
use herald_transport::TransportError;
use thiserror::Error;

use crate::config::ConfigError;

/// Why the relay loop stopped.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The shared cancellation token fired.
    #[error("relay cancelled")]
    Cancelled,

    /// The platform connection could not be established.
    #[error("platform handshake failed: {0}")]
    Handshake(#[source] PlatformError),

    /// The platform event stream ended.
    #[error("platform event source closed")]
    SourceClosed,
}

/// Errors that can occur while building or running the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The platform connection could not be created.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// A network front end could not be started.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A responder could not be built from its configuration.
    #[error("Responder setup failed: {0}")]
    Responder(String),

    /// The transcript file could not be opened.
    #[error("Transcript setup failed: {0}")]
    Transcript(#[from] herald_core::TranscriptError),

    /// The relay stopped with a fatal error.
    #[error("Relay stopped: {0}")]
    Relay(#[from] RelayError),
}

/// Result type for the relay loop.
pub type RelayResult<T> = Result<T, RelayError>;

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

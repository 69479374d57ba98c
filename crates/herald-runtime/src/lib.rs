//! Herald Runtime - the relay loop and everything around it.
//!
//! This crate provides:
//! - The [`EventRelay`]: one loop over platform events and bridge broadcasts
//! - Layered configuration loading ([`ConfigLoader`], [`HeraldConfig`])
//! - Logging configuration ([`LoggingBuilder`])
//! - A JSON-lines transcript recorder ([`FileTranscript`])
//! - Runtime orchestration ([`HeraldRuntime`])
//!
//! ```ignore
//! use herald_runtime::HeraldRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Loads herald.toml, applies HERALD_* overrides, sets up logging
//!     let runtime = HeraldRuntime::builder().build()?;
//!
//!     // Run until Ctrl+C
//!     runtime.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Feature Flags
//!
//! - `toml-config` (default): TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output
//! - `anecdote` (default): registers the joke responder

pub mod config;
pub mod error;
pub mod logging;
pub mod relay;
pub mod runtime;
pub mod transcript;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, HeraldConfig, Profile};
pub use error::{RelayError, RelayResult, RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use relay::{DEFAULT_OUTBOUND_TIMEOUT, EventRelay, restrict_duration, restrict_until};
pub use runtime::{HeraldRuntime, RuntimeBuilder, build_dispatcher};
pub use transcript::FileTranscript;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}

//! Configuration module for the Herald runtime.
//!
//! This module provides layered (file + environment) configuration loading
//! and validation for the relay, the Telegram connection, moderation policy,
//! the broadcast bridge and the built-in responders.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile};
pub use schema::{
    BridgeConfig, HeraldConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    MENTION_PLACEHOLDER, ModerationConfig, PluginsConfig, RelayConfig, SpanEventConfig,
    render_warning,
};
pub use validation::validate_config;

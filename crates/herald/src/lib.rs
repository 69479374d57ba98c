//! # Herald
//!
//! A moderated relay for a single Telegram group.
//!
//! ## Overview
//!
//! Herald watches one group chat, throttles members who post too often,
//! answers messages through an ordered list of responders and pins
//! announcements pushed to it over a plain TCP line protocol.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────┐     ┌──────────────────┐
//! │   Telegram   │────▶│   Relay    │────▶│ ModerationGuard  │
//! │  (adapter)   │◀────│   (loop)   │────▶│ PluginDispatcher │──▶ Sys, Anecdote, Help
//! └──────────────┘     └────────────┘     └──────────────────┘
//!                            ▲
//!                            │
//!                     ┌──────┴───────┐     ┌──────────────┐
//!                     │ExternalBridge│◀────│ LineListener │◀── TCP clients
//!                     └──────────────┘     └──────────────┘
//! ```
//!
//! - **Runtime**: loads configuration, sets up logging, owns shutdown
//! - **Adapter**: talks to the Telegram Bot API
//! - **Relay**: moderates, dispatches and broadcasts on one task
//! - **Responders**: plain async types implementing [`prelude::Responder`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = HeraldRuntime::builder().profile("production").build()?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output
//! - `anecdote` (default): the joke responder

pub use herald_adapter_telegram as telegram;
pub use herald_core as core;
pub use herald_framework as framework;
pub use herald_runtime as runtime;
pub use herald_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use herald_runtime::{HeraldConfig, HeraldRuntime, RuntimeBuilder};

    // Responders - for extending the dispatcher
    pub use herald_core::{
        Answer, InboundMessage, PluginDispatcher, Responder, ResponderError, ResponderResult,
        contains_trigger, help_line,
    };

    // Bridge - for pushing broadcasts from other tasks
    pub use herald_core::{BridgeHandle, Submitter};

    // Platform boundary for custom adapters
    pub use herald_core::{PlatformConnection, PlatformSession, SendOptions};
}

//! # Herald Telegram Adapter
//!
//! [`TelegramPlatform`] connects the Herald relay to a Telegram group through
//! the Bot API.
//!
//! ## Handshake
//!
//! [`open`](herald_core::PlatformConnection::open) checks the token with
//! `getMe`, clears any webhook, resolves the configured group (numeric id or
//! public username) and starts a long-polling task. Any failure here is
//! fatal.
//!
//! ## Example
//!
//! ```rust,ignore
//! use herald_adapter_telegram::{TelegramConfig, TelegramPlatform};
//!
//! let platform = TelegramPlatform::new(config.telegram.clone(), shutdown.clone())?;
//! let relay = EventRelay::new(Arc::new(platform), guard, dispatcher, bridge_rx, transcript);
//! relay.run(shutdown).await?;
//! ```
//!
//! The bot must be an administrator of the group to pin messages and
//! restrict members.

pub mod config;
pub mod convert;
pub mod platform;

pub use config::{GroupRef, TelegramConfig};
pub use platform::TelegramPlatform;

//! Configuration types for the Telegram adapter.
//!
//! # Example Configuration
//!
//! ```toml
//! [telegram]
//! token = "123456:ABC"        # or HERALD_TELEGRAM__TOKEN
//! group = "radio_t_chat"      # public username or numeric chat id
//! poll_timeout_secs = 30
//! # api_url = "http://127.0.0.1:8081/"
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Telegram adapter configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token.
    pub token: String,

    /// Moderated group: a numeric chat id, or a public username with or
    /// without the leading `@`.
    pub group: String,

    /// Override of the Bot API base URL.
    pub api_url: Option<String>,

    /// Long-polling timeout in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u32,
}

fn default_poll_timeout() -> u32 {
    30
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            group: String::new(),
            api_url: None,
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

impl TelegramConfig {
    /// Long-polling timeout.
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.poll_timeout_secs))
    }

    /// Parses the configured group.
    pub fn group_ref(&self) -> GroupRef {
        GroupRef::parse(&self.group)
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("group", &self.group)
            .field("api_url", &self.api_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

/// How the moderated group is referenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupRef {
    /// Numeric chat id.
    Id(i64),
    /// Public username, always `@`-prefixed.
    Username(String),
}

impl GroupRef {
    /// Numeric strings are ids; anything else is a username.
    pub fn parse(group: &str) -> Self {
        let group = group.trim();
        match group.parse::<i64>() {
            Ok(id) => Self::Id(id),
            Err(_) if group.starts_with('@') => Self::Username(group.to_string()),
            Err(_) => Self::Username(format!("@{group}")),
        }
    }
}

impl fmt::Display for GroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Username(name) => f.write_str(name),
        }
    }
}

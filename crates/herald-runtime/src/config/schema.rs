//! Configuration schema definitions.
//!
//! # Example Configuration
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "compact"
//!
//! [telegram]
//! token = "123456:ABC"
//! group = "radio_t_chat"
//!
//! [moderation]
//! allowed_period_secs = 120
//! ban_penalty = 2
//! ban_duration_secs = 600
//! exclude = ["umputun", "bobuk"]
//!
//! [relay]
//! outbound_timeout_secs = 10
//! transcript_path = "logs/transcript.jsonl"
//!
//! [bridge]
//! listen = "0.0.0.0:18001"
//! capacity = 100
//!
//! [plugins.sys]
//! say = ["Не все то золото, что блестит"]
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use herald_adapter_telegram::TelegramConfig;
use herald_core::{DEFAULT_BRIDGE_CAPACITY, DEFAULT_RESPONDER_TIMEOUT, ExcludeSet, GuardConfig};
#[cfg(feature = "anecdote")]
use herald_framework::AnecdoteConfig;
use herald_framework::{HelpConfig, SysConfig};
use herald_transport::{DEFAULT_PINNED, ListenerConfig};
use serde::{Deserialize, Serialize};

/// Placeholder replaced by the sender mention in the ban warning.
pub const MENTION_PLACEHOLDER: &str = "{mention}";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HeraldConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Telegram connection.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Flood protection policy.
    #[serde(default)]
    pub moderation: ModerationConfig,

    /// Relay loop settings.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Broadcast bridge and its TCP front end.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Built-in responders.
    #[serde(default)]
    pub plugins: PluginsConfig,
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level name as used in filter directives.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Rotation of the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global level; `RUST_LOG` takes precedence.
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    pub span_events: SpanEventConfig,
    /// Include thread ids.
    pub thread_ids: bool,
    /// Include file and line of the call site.
    pub file_location: bool,
    /// Log file, required for `output = "file"`.
    pub file_path: Option<PathBuf>,
    pub rotation: LogRotation,
    /// Per-module levels, e.g. `herald_runtime = "debug"`.
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            file_path: None,
            rotation: LogRotation::Never,
            filters: HashMap::new(),
        }
    }
}

// =============================================================================
// Moderation
// =============================================================================

/// Flood protection policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerationConfig {
    /// Length of the counting window in seconds.
    pub allowed_period_secs: u64,
    /// Messages tolerated inside one window.
    pub ban_penalty: u32,
    /// Ban length in seconds.
    pub ban_duration_secs: u64,
    /// Usernames never moderated.
    pub exclude: Vec<String>,
    /// Warning posted when a ban starts; `{mention}` is replaced by the
    /// sender.
    pub warning: String,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            allowed_period_secs: 120,
            ban_penalty: 2,
            ban_duration_secs: 600,
            exclude: Vec::new(),
            warning: format!("{MENTION_PLACEHOLDER} _тебя слишком много, отдохни..._"),
        }
    }
}

impl ModerationConfig {
    /// Builds the guard policy.
    pub fn guard_config(&self) -> GuardConfig {
        GuardConfig {
            allowed_period: Duration::from_secs(self.allowed_period_secs),
            ban_penalty: self.ban_penalty,
            ban_duration: Duration::from_secs(self.ban_duration_secs),
            exclude: ExcludeSet::new(&self.exclude),
        }
    }
}

/// Fills `{mention}` in a warning template.
pub fn render_warning(template: &str, mention: &str) -> String {
    template.replace(MENTION_PLACEHOLDER, mention)
}

// =============================================================================
// Relay
// =============================================================================

/// Relay loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Budget of every send, pin and restrict call, in seconds.
    pub outbound_timeout_secs: u64,
    /// Budget of a single responder call, in seconds.
    pub responder_timeout_secs: u64,
    /// JSON-lines transcript of the moderated chat. Disabled when unset.
    pub transcript_path: Option<PathBuf>,
    /// Messages buffered in front of the transcript writer.
    pub transcript_buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            outbound_timeout_secs: 10,
            responder_timeout_secs: DEFAULT_RESPONDER_TIMEOUT.as_secs(),
            transcript_path: None,
            transcript_buffer: 1024,
        }
    }
}

impl RelayConfig {
    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_secs(self.outbound_timeout_secs)
    }

    pub fn responder_timeout(&self) -> Duration {
        Duration::from_secs(self.responder_timeout_secs)
    }
}

// =============================================================================
// Bridge
// =============================================================================

/// Broadcast bridge and the TCP listener feeding it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Start the TCP listener.
    pub enabled: bool,
    /// Pending broadcasts before submitters block.
    pub capacity: usize,
    /// Listener address.
    pub listen: String,
    /// Lines pinned after posting.
    pub pinned: Vec<String>,
    /// Seconds a client may take to deliver its line.
    pub read_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_BRIDGE_CAPACITY,
            listen: "0.0.0.0:18001".to_string(),
            pinned: DEFAULT_PINNED.iter().map(|s| s.to_string()).collect(),
            read_timeout_secs: 10,
        }
    }
}

impl BridgeConfig {
    /// Builds the listener settings.
    pub fn listener_config(&self) -> ListenerConfig {
        ListenerConfig {
            addr: self.listen.clone(),
            pinned: self.pinned.clone(),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
        }
    }
}

// =============================================================================
// Plugins
// =============================================================================

/// Built-in responder settings. Responders are registered in field order,
/// with `help` always last.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    pub sys: SysConfig,
    #[cfg(feature = "anecdote")]
    pub anecdote: AnecdoteConfig,
    pub help: HelpConfig,
}

//! Runtime orchestration.
//!
//! [`HeraldRuntime`] turns a [`HeraldConfig`] into a running relay: it builds
//! the moderation guard, the responder chain, the bridge and the transcript,
//! starts the broadcast listener, ties Ctrl+C / SIGTERM to the shared
//! cancellation token and drives the [`EventRelay`] until it stops.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use herald_runtime::HeraldRuntime;
//!
//! // herald.toml from the current directory, HERALD_* overrides
//! let runtime = HeraldRuntime::builder().build()?;
//! runtime.run().await?;
//!
//! // Custom configuration path and profile
//! let runtime = HeraldRuntime::builder()
//!     .config_file("config/herald.toml")
//!     .profile("production")
//!     .build()?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use herald_adapter_telegram::TelegramPlatform;
use herald_core::{
    ExternalBridge, ModerationGuard, NullTranscript, PlatformConnection, PluginDispatcher,
    Transcript,
};
#[cfg(feature = "anecdote")]
use herald_framework::Anecdote;
use herald_framework::{Help, Sys};
#[cfg(feature = "anecdote")]
use herald_transport::HttpClient;
use herald_transport::LineListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ConfigLoader, ConfigResult, HeraldConfig, PluginsConfig, validate_config};
use crate::error::{RelayError, RuntimeError, RuntimeResult};
use crate::logging;
use crate::relay::EventRelay;
use crate::transcript::FileTranscript;

/// How long shutdown waits for the transcript writer to flush.
const TRANSCRIPT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// The Herald runtime.
pub struct HeraldRuntime {
    config: HeraldConfig,
    cancel: CancellationToken,
}

impl HeraldRuntime {
    /// Creates a runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from a loaded configuration.
    ///
    /// Initializes logging from the configuration (a no-op if a subscriber
    /// is already installed) and validates the rest.
    pub fn from_config(config: HeraldConfig) -> ConfigResult<Self> {
        logging::init_from_config(&config.logging);
        validate_config(&config)?;

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            group = %config.telegram.group,
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// The effective configuration.
    pub fn config(&self) -> &HeraldConfig {
        &self.config
    }

    /// The token that stops the relay, the listener and every pending
    /// bridge submission.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Connects to Telegram and runs until a shutdown signal arrives or
    /// the relay fails.
    pub async fn run(self) -> RuntimeResult<()> {
        let platform = TelegramPlatform::new(self.config.telegram.clone(), self.cancel.clone())?;

        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            wait_for_shutdown().await;
            cancel.cancel();
        });

        info!("Herald is now running. Press Ctrl+C to stop.");
        self.run_with(platform).await
    }

    /// Runs the relay over any platform until the cancellation token fires
    /// or the relay fails.
    ///
    /// Cancellation is a clean exit; a failed handshake or a lost event
    /// source is returned as [`RuntimeError::Relay`].
    pub async fn run_with<P: PlatformConnection>(self, platform: P) -> RuntimeResult<()> {
        let Self { config, cancel } = self;

        let dispatcher = build_dispatcher(&config.plugins, config.relay.responder_timeout())?;
        let guard = ModerationGuard::new(config.moderation.guard_config());
        let (bridge, receiver) = ExternalBridge::channel(config.bridge.capacity, cancel.clone());

        let listener = if config.bridge.enabled {
            let listener = LineListener::bind(config.bridge.listener_config()).await?;
            Some(tokio::spawn(listener.run(Arc::new(bridge), cancel.clone())))
        } else {
            drop(bridge);
            None
        };

        let (transcript, writer) = match &config.relay.transcript_path {
            Some(path) => {
                let (transcript, writer) =
                    FileTranscript::spawn(path, config.relay.transcript_buffer).await?;
                (Arc::new(transcript) as Arc<dyn Transcript>, Some(writer))
            }
            None => (Arc::new(NullTranscript) as Arc<dyn Transcript>, None),
        };

        let relay = EventRelay::new(platform, guard, dispatcher, receiver)
            .with_transcript(transcript)
            .with_warning(config.moderation.warning.clone())
            .with_outbound_timeout(config.relay.outbound_timeout());

        let result = relay.run(cancel.clone()).await;

        // stop the listener and the platform poller whatever the reason
        cancel.cancel();
        if let Some(listener) = listener {
            let _ = listener.await;
        }
        if let Some(writer) = writer
            && tokio::time::timeout(TRANSCRIPT_FLUSH_TIMEOUT, writer)
                .await
                .is_err()
        {
            warn!("Transcript writer did not finish in time");
        }

        match result {
            Ok(()) | Err(RelayError::Cancelled) => {
                info!("Herald stopped");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Builds the responder chain: `sys`, then `anecdote` (with the feature),
/// then `help` over everything before it.
pub fn build_dispatcher(
    plugins: &PluginsConfig,
    timeout: Duration,
) -> RuntimeResult<PluginDispatcher> {
    let mut dispatcher = PluginDispatcher::new().with_timeout(timeout);

    let sys = Sys::new(plugins.sys.clone())
        .map_err(|e| RuntimeError::Responder(format!("sys: {e}")))?;
    dispatcher.add(sys);

    #[cfg(feature = "anecdote")]
    dispatcher.add(Anecdote::new(HttpClient::new()?, plugins.anecdote.clone()));

    let help = Help::new(plugins.help.clone(), &dispatcher.help());
    dispatcher.add(help);

    debug!(responders = ?dispatcher.names(), "Responders registered");
    Ok(dispatcher)
}

/// Waits for shutdown signals (Ctrl+C or SIGTERM).
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => {
                        info!("Received Ctrl+C, shutting down");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Can't register SIGTERM handler, waiting for Ctrl+C only");
                if signal::ctrl_c().await.is_ok() {
                    info!("Received Ctrl+C, shutting down");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        }
    }
}

/// Builder for [`HeraldRuntime`].
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: HeraldConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> ConfigResult<HeraldRuntime> {
        let config = self.config_loader.load()?;
        HeraldRuntime::from_config(config)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

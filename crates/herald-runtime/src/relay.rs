//! The event relay: one loop over platform events and bridge broadcasts.
//!
//! ```text
//!             ┌──────── cancel ─────────▶ Err(Cancelled)
//!             │
//!   select! ──┼── platform event ──▶ transform ─▶ transcript ─▶ guard ─┬─ banned now ─▶ warn + restrict
//!             │                                                       ├─ banned      ─▶ drop
//!             │                                                       └─ clear       ─▶ dispatch ─▶ send ─▶ pin?
//!             │
//!             └── bridge item ──▶ send ─▶ transcript ─▶ pin?
//! ```
//!
//! The loop owns the guard and the dispatcher; nothing here is shared with
//! other tasks except the bridge receiver's queue. Per-message failures are
//! logged and the loop moves on. Only a failed handshake, a closed event
//! stream or cancellation end it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures::StreamExt;
use herald_core::{
    BridgeItem, BridgeReceiver, ChatTarget, InboundMessage, ModerationGuard, NullTranscript,
    PlatformConnection, PlatformError, PlatformResult, PluginDispatcher, SendOptions, Transcript,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::{ModerationConfig, render_warning};
use crate::error::{RelayError, RelayResult};

/// Budget of a single outbound platform call when none is configured.
pub const DEFAULT_OUTBOUND_TIMEOUT: Duration = Duration::from_secs(10);

/// Restrictions shorter than this are treated as permanent by the platform.
const MIN_RESTRICT: Duration = Duration::from_secs(30);

/// What a too-short restriction is raised to.
const RESTRICT_FLOOR: Duration = Duration::from_secs(60);

/// Length of the restriction actually requested for a ban of `ban`.
pub fn restrict_duration(ban: Duration) -> Duration {
    if ban < MIN_RESTRICT { RESTRICT_FLOOR } else { ban }
}

/// End of a restriction of `ban` starting at `now`.
pub fn restrict_until(now: DateTime<Utc>, ban: Duration) -> DateTime<Utc> {
    let delta = TimeDelta::from_std(restrict_duration(ban)).unwrap_or(TimeDelta::MAX);
    now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

enum Step<E> {
    Cancel,
    Event(Option<E>),
    Broadcast(Option<BridgeItem>),
}

/// The relay between a platform, the moderation guard, the responders and
/// the broadcast bridge.
pub struct EventRelay<P: PlatformConnection> {
    platform: P,
    guard: ModerationGuard,
    dispatcher: PluginDispatcher,
    bridge: BridgeReceiver,
    transcript: Arc<dyn Transcript>,
    warning: String,
    outbound_timeout: Duration,
}

impl<P: PlatformConnection> EventRelay<P> {
    /// Creates a relay with no transcript and the default warning.
    pub fn new(
        platform: P,
        guard: ModerationGuard,
        dispatcher: PluginDispatcher,
        bridge: BridgeReceiver,
    ) -> Self {
        Self {
            platform,
            guard,
            dispatcher,
            bridge,
            transcript: Arc::new(NullTranscript),
            warning: ModerationConfig::default().warning,
            outbound_timeout: DEFAULT_OUTBOUND_TIMEOUT,
        }
    }

    /// Records the moderated chat.
    pub fn with_transcript(mut self, transcript: Arc<dyn Transcript>) -> Self {
        self.transcript = transcript;
        self
    }

    /// Sets the ban warning; `{mention}` is replaced by the sender.
    pub fn with_warning(mut self, template: impl Into<String>) -> Self {
        self.warning = template.into();
        self
    }

    /// Sets the budget of every send, pin and restrict call.
    pub fn with_outbound_timeout(mut self, timeout: Duration) -> Self {
        self.outbound_timeout = timeout;
        self
    }

    /// Connects and processes events until `cancel` fires or the platform
    /// goes away.
    ///
    /// Always returns an error describing why the loop stopped;
    /// [`RelayError::Cancelled`] is the clean shutdown.
    pub async fn run(mut self, cancel: CancellationToken) -> RelayResult<()> {
        let session = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RelayError::Cancelled),
            opened = self.platform.open() => opened.map_err(|e| {
                error!(error = %e, "Platform handshake failed");
                RelayError::Handshake(e)
            })?,
        };

        let home = session.home_chat;
        let mut events = session.events;
        let mut bridge_open = true;
        info!(chat = %home, responders = ?self.dispatcher.names(), "Relay started");

        loop {
            // cancellation first, then chat events and broadcasts in random order
            let bridge = &mut self.bridge;
            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => Step::Cancel,
                step = async {
                    tokio::select! {
                        event = events.next() => Step::Event(event),
                        item = bridge.drain(), if bridge_open => Step::Broadcast(item),
                    }
                } => step,
            };

            match step {
                Step::Cancel => {
                    info!("Relay cancelled");
                    return Err(RelayError::Cancelled);
                }
                Step::Event(Some(event)) => self.on_event(home, event).await,
                Step::Event(None) => {
                    error!("Platform event stream closed");
                    return Err(RelayError::SourceClosed);
                }
                Step::Broadcast(Some(item)) => self.on_broadcast(home, item).await,
                Step::Broadcast(None) => {
                    debug!("Bridge closed, only platform events remain");
                    bridge_open = false;
                }
            }
        }
    }

    async fn on_event(&mut self, home: ChatTarget, event: P::Event) {
        let msg = match self.platform.transform(&event) {
            Ok(Some(msg)) => msg,
            Ok(None) => {
                trace!(?event, "Ignoring event");
                return;
            }
            Err(e) => {
                debug!(error = %e, "Skipping malformed event");
                return;
            }
        };

        if msg.is_empty() {
            trace!(msg_id = %msg.id, "Skipping message without content");
            return;
        }

        debug!(
            chat = %msg.chat,
            from = %msg.from,
            msg_id = %msg.id,
            text = %msg.text,
            "Inbound message"
        );

        if msg.chat == home {
            self.record(&msg);
        }

        let verdict = self.guard.check(&msg.from, msg.sent);
        if verdict.active {
            if verdict.is_new {
                self.punish(home, &msg).await;
            } else {
                trace!(from = %msg.from, "Dropping message from banned user");
            }
            return;
        }

        let reply = self.dispatcher.dispatch(&msg).await;
        if !reply.send {
            return;
        }

        let sent = match self
            .outbound(self.platform.send(msg.chat, &reply.text, SendOptions::reply()))
            .await
        {
            Ok(sent) => sent,
            Err(e) => {
                warn!(chat = %msg.chat, error = %e, "Can't send reply");
                return;
            }
        };

        if sent.chat == home {
            self.record(&sent);
        }
        if reply.pin {
            self.pin(&sent).await;
        }
    }

    async fn on_broadcast(&mut self, home: ChatTarget, item: BridgeItem) {
        info!(pin = item.pin, "Posting broadcast");

        let sent = match self
            .outbound(self.platform.send(home, &item.text, SendOptions::broadcast()))
            .await
        {
            Ok(sent) => sent,
            Err(e) => {
                warn!(chat = %home, error = %e, "Can't post broadcast");
                return;
            }
        };

        self.record(&sent);
        if item.pin {
            self.pin(&sent).await;
        }
    }

    /// Warns the sender, then restricts them for the ban duration.
    async fn punish(&self, home: ChatTarget, msg: &InboundMessage) {
        info!(
            user = %msg.from,
            chat = %msg.chat,
            ban = ?self.guard.ban_duration(),
            "Flood detected, banning"
        );

        let mention = self.platform.mention(&msg.from);
        let warning = render_warning(&self.warning, &mention);
        match self
            .outbound(self.platform.send(msg.chat, &warning, SendOptions::reply()))
            .await
        {
            Ok(sent) if sent.chat == home => self.record(&sent),
            Ok(_) => {}
            Err(e) => warn!(user = %msg.from, error = %e, "Can't send ban warning"),
        }

        let Some(user) = msg.from.handle else {
            warn!(user = %msg.from, "Sender has no platform handle, can't restrict");
            return;
        };

        let until = restrict_until(Utc::now(), self.guard.ban_duration());
        if let Err(e) = self
            .outbound(self.platform.restrict(msg.chat, user, until))
            .await
        {
            error!(user = %msg.from, chat = %msg.chat, error = %e, "Can't restrict user");
        }
    }

    async fn pin(&self, sent: &InboundMessage) {
        if let Err(e) = self.outbound(self.platform.pin(sent.chat, sent.id)).await {
            warn!(chat = %sent.chat, msg_id = %sent.id, error = %e, "Can't pin message");
        }
    }

    fn record(&self, msg: &InboundMessage) {
        if let Err(e) = self.transcript.save(msg) {
            warn!(msg_id = %msg.id, error = %e, "Can't record message");
        }
    }

    async fn outbound<T>(&self, call: impl Future<Output = PlatformResult<T>>) -> PlatformResult<T> {
        tokio::time::timeout(self.outbound_timeout, call)
            .await
            .map_err(|_| PlatformError::Timeout(self.outbound_timeout))?
    }
}

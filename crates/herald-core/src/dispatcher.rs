//! Responder dispatch.
//!
//! A [`PluginDispatcher`] holds an ordered list of [`Responder`]s. For each
//! inbound message the responders are asked in registration order and the
//! first one that answers wins; the rest are not consulted.
//!
//! ```rust,ignore
//! use herald_core::{PluginDispatcher, InboundMessage};
//!
//! let dispatcher = PluginDispatcher::new()
//!     .with(Sys::default())
//!     .with(Anecdote::new(client));
//!
//! let reply = dispatcher.dispatch(&msg).await;
//! if reply.send {
//!     platform.send(msg.chat, &reply.text, SendOptions::reply()).await?;
//! }
//! ```
//!
//! # Isolation
//!
//! A responder that returns an error, panics or exceeds the dispatcher's
//! time budget is logged and treated as not matching; dispatch continues
//! with the next responder.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{Instrument, Level, debug, span, warn};

use crate::error::ResponderResult;
use crate::foundation::{Answer, InboundMessage, Reply};

/// Default time budget for a single responder call.
pub const DEFAULT_RESPONDER_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Responder
// =============================================================================

/// A pluggable component that may answer chat messages.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Tokens this responder reacts to.
    fn react_on(&self) -> Vec<String>;

    /// Looks at a message and answers if it matches.
    ///
    /// `Ok(None)` means "not for me". Errors are logged by the dispatcher
    /// and count as no match.
    async fn on_message(&self, msg: &InboundMessage) -> ResponderResult<Option<Answer>>;

    /// Help text, one line per command, each line ending with `\n`.
    fn help(&self) -> String;

    /// Returns `true` if the message text is one of [`react_on`](Self::react_on).
    fn reacts_to(&self, msg: &InboundMessage) -> bool {
        contains_trigger(&self.react_on(), msg.trimmed_text())
    }
}

/// Shared responder handle.
pub type BoxedResponder = Arc<dyn Responder>;

/// Case-insensitive check of `text` against a list of trigger tokens.
pub fn contains_trigger<S: AsRef<str>>(triggers: &[S], text: &str) -> bool {
    let text = text.trim().to_lowercase();
    triggers.iter().any(|t| t.as_ref().to_lowercase() == text)
}

/// Formats a help line the way every built-in responder does:
/// `trigger1, trigger2 _– description_`.
pub fn help_line<S: AsRef<str>>(triggers: &[S], description: &str) -> String {
    let names: Vec<&str> = triggers.iter().map(AsRef::as_ref).collect();
    format!("{} _– {}_\n", names.join(", "), description)
}

// =============================================================================
// PluginDispatcher
// =============================================================================

/// Ordered first-match dispatcher over [`Responder`]s.
#[derive(Clone)]
pub struct PluginDispatcher {
    responders: Vec<BoxedResponder>,
    timeout: Duration,
}

impl Default for PluginDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginDispatcher {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self {
            responders: Vec::new(),
            timeout: DEFAULT_RESPONDER_TIMEOUT,
        }
    }

    /// Sets the time budget of a single responder call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Appends a responder.
    pub fn add<R: Responder + 'static>(&mut self, responder: R) {
        self.responders.push(Arc::new(responder));
    }

    /// Appends a responder (builder pattern).
    pub fn with<R: Responder + 'static>(mut self, responder: R) -> Self {
        self.add(responder);
        self
    }

    /// Number of registered responders.
    pub fn len(&self) -> usize {
        self.responders.len()
    }

    /// Returns `true` if no responder is registered.
    pub fn is_empty(&self) -> bool {
        self.responders.is_empty()
    }

    /// Names of the registered responders, in dispatch order.
    pub fn names(&self) -> Vec<&str> {
        self.responders.iter().map(|r| r.name()).collect()
    }

    /// Concatenated help of every registered responder.
    pub fn help(&self) -> String {
        self.responders.iter().map(|r| r.help()).collect()
    }

    /// Asks the responders in order and returns the first answer.
    pub async fn dispatch(&self, msg: &InboundMessage) -> Reply {
        let span = span!(Level::DEBUG, "dispatch", msg_id = %msg.id);

        async {
            for responder in &self.responders {
                if let Some(answer) = self.ask(responder.as_ref(), msg).await {
                    debug!(
                        responder = responder.name(),
                        pin = answer.pin,
                        "Responder answered"
                    );
                    return answer.into();
                }
            }
            Reply::none()
        }
        .instrument(span)
        .await
    }

    async fn ask(&self, responder: &dyn Responder, msg: &InboundMessage) -> Option<Answer> {
        let call = AssertUnwindSafe(responder.on_message(msg)).catch_unwind();

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(Ok(answer))) => answer,
            Ok(Ok(Err(e))) => {
                warn!(responder = responder.name(), error = %e, "Responder failed");
                None
            }
            Ok(Err(_)) => {
                warn!(responder = responder.name(), "Responder panicked");
                None
            }
            Err(_) => {
                warn!(
                    responder = responder.name(),
                    timeout = ?self.timeout,
                    "Responder timed out"
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for PluginDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDispatcher")
            .field("responders", &self.names())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;

    use super::*;
    use crate::error::ResponderError;
    use crate::foundation::{ChatTarget, Identity, MessageHandle};

    enum Behavior {
        Answer(&'static str, bool),
        Silent,
        Fail,
        Panic,
        Hang,
    }

    struct Scripted {
        name: &'static str,
        trigger: &'static str,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn new(name: &'static str, trigger: &'static str, behavior: Behavior) -> Self {
            Self {
                name,
                trigger,
                behavior,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl Responder for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn react_on(&self) -> Vec<String> {
            vec![self.trigger.to_string()]
        }

        async fn on_message(&self, msg: &InboundMessage) -> ResponderResult<Option<Answer>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.reacts_to(msg) {
                return Ok(None);
            }
            match self.behavior {
                Behavior::Answer(text, pin) => Ok(Some(Answer { text: text.into(), pin })),
                Behavior::Silent => Ok(None),
                Behavior::Fail => Err(ResponderError::upstream("http://example", "refused")),
                Behavior::Panic => panic!("responder bug"),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(None)
                }
            }
        }

        fn help(&self) -> String {
            help_line(&[self.trigger], self.name)
        }
    }

    fn msg(text: &str) -> InboundMessage {
        InboundMessage::new(
            MessageHandle(1),
            ChatTarget(-100),
            Utc::now(),
            Identity::new("user", "User"),
            text,
        )
    }

    #[tokio::test]
    async fn empty_dispatcher_sends_nothing() {
        let d = PluginDispatcher::new();
        assert_eq!(d.dispatch(&msg("ping")).await, Reply::none());
    }

    #[tokio::test]
    async fn first_match_wins() {
        let second = Scripted::new("b", "ping", Behavior::Answer("from b", false));
        let second_calls = Arc::clone(&second.calls);
        let d = PluginDispatcher::new()
            .with(Scripted::new("a", "ping", Behavior::Answer("from a", true)))
            .with(second);

        let reply = d.dispatch(&msg("ping")).await;
        assert_eq!(
            reply,
            Reply {
                text: "from a".into(),
                send: true,
                pin: true
            }
        );
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn later_responder_answers_when_earlier_do_not_match() {
        let d = PluginDispatcher::new()
            .with(Scripted::new("a", "news!", Behavior::Answer("news", false)))
            .with(Scripted::new("b", "ping", Behavior::Silent))
            .with(Scripted::new("c", "ping", Behavior::Answer("pong", false)));

        let reply = d.dispatch(&msg("PING")).await;
        assert!(reply.send);
        assert_eq!(reply.text, "pong");
        assert!(!reply.pin);
    }

    #[tokio::test]
    async fn failing_responder_is_skipped() {
        let d = PluginDispatcher::new()
            .with(Scripted::new("broken", "joke!", Behavior::Fail))
            .with(Scripted::new("backup", "joke!", Behavior::Answer("ha", false)));

        assert_eq!(d.dispatch(&msg("joke!")).await.text, "ha");
    }

    #[tokio::test]
    async fn panicking_responder_is_skipped() {
        let d = PluginDispatcher::new()
            .with(Scripted::new("buggy", "joke!", Behavior::Panic))
            .with(Scripted::new("backup", "joke!", Behavior::Answer("ha", false)));

        assert_eq!(d.dispatch(&msg("joke!")).await.text, "ha");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_responder_times_out() {
        let d = PluginDispatcher::new()
            .with_timeout(Duration::from_secs(2))
            .with(Scripted::new("slow", "joke!", Behavior::Hang))
            .with(Scripted::new("backup", "joke!", Behavior::Answer("ha", false)));

        assert_eq!(d.dispatch(&msg("joke!")).await.text, "ha");
    }

    #[tokio::test]
    async fn no_match_returns_unsendable_reply() {
        let d = PluginDispatcher::new()
            .with(Scripted::new("a", "ping", Behavior::Answer("pong", false)));
        let reply = d.dispatch(&msg("hello there")).await;
        assert!(!reply.send);
    }

    #[test]
    fn help_is_concatenated_in_order() {
        let d = PluginDispatcher::new()
            .with(Scripted::new("first", "a!", Behavior::Silent))
            .with(Scripted::new("second", "b!", Behavior::Silent));
        assert_eq!(d.help(), "a! _– first_\nb! _– second_\n");
        assert_eq!(d.names(), vec!["first", "second"]);
    }

    #[test]
    fn trigger_matching_ignores_case_and_whitespace() {
        assert!(contains_trigger(&["Анекдот!"], "  анекдот! "));
        assert!(contains_trigger(&["ping"], "PING"));
        assert!(!contains_trigger(&["ping"], "ping pong"));
    }
}

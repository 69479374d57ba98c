//! The chat platform boundary.
//!
//! A [`PlatformConnection`] is everything the relay needs from a chat
//! service: a handshake that yields the moderated chat and a stream of raw
//! events, a transform from raw events into [`InboundMessage`]s, and three
//! outbound operations (send, pin, restrict).
//!
//! ```text
//!   open() ──▶ PlatformSession { home_chat, events }
//!                                         │
//!             transform(event) ◀──────────┘
//!                  │
//!                  ▼
//!            InboundMessage ──▶ relay ──▶ send / pin / restrict
//! ```

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::error::{PlatformResult, TransformError};
use crate::foundation::{ChatTarget, Identity, InboundMessage, MessageHandle, UserHandle};

/// How an outbound text is rendered by the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Interpret the text as Markdown.
    pub markdown: bool,
    /// Suppress link previews.
    pub disable_link_preview: bool,
}

impl SendOptions {
    /// Options for responder answers and warnings: Markdown, no previews.
    pub const fn reply() -> Self {
        Self {
            markdown: true,
            disable_link_preview: true,
        }
    }

    /// Options for bridge broadcasts: Markdown with previews.
    pub const fn broadcast() -> Self {
        Self {
            markdown: true,
            disable_link_preview: false,
        }
    }
}

/// An established platform session.
pub struct PlatformSession<E> {
    /// The chat this relay moderates and answers in.
    pub home_chat: ChatTarget,
    /// Raw inbound events, in delivery order. Ends only when the platform
    /// connection is lost.
    pub events: BoxStream<'static, E>,
}

impl<E> Debug for PlatformSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformSession")
            .field("home_chat", &self.home_chat)
            .finish_non_exhaustive()
    }
}

/// A connection to a chat platform.
#[async_trait]
pub trait PlatformConnection: Send + Sync + 'static {
    /// Raw event type delivered by the platform.
    type Event: Send + Debug + 'static;

    /// Connects, resolves the moderated chat and starts receiving events.
    ///
    /// Any error here is fatal for the relay.
    async fn open(&self) -> PlatformResult<PlatformSession<Self::Event>>;

    /// Turns a raw event into a message.
    ///
    /// `Ok(None)` means the event carries nothing the relay looks at.
    fn transform(&self, event: &Self::Event) -> Result<Option<InboundMessage>, TransformError>;

    /// Renders a reference to `who` that notifies them when posted.
    fn mention(&self, who: &Identity) -> String {
        who.to_string()
    }

    /// Posts `text` into `chat` and returns the message as posted.
    async fn send(
        &self,
        chat: ChatTarget,
        text: &str,
        options: SendOptions,
    ) -> PlatformResult<InboundMessage>;

    /// Pins a message.
    async fn pin(&self, chat: ChatTarget, message: MessageHandle) -> PlatformResult<()>;

    /// Prevents `user` from posting in `chat` until `until`.
    async fn restrict(
        &self,
        chat: ChatTarget,
        user: UserHandle,
        until: DateTime<Utc>,
    ) -> PlatformResult<()>;
}

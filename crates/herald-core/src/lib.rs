//! # Herald Core
//!
//! The building blocks of the Herald chat relay.
//!
//! This crate holds the pieces the relay loop is made of and the traits its
//! collaborators implement. It does no I/O of its own.
//!
//! ## Components
//!
//! - **Foundation**: the message model ([`InboundMessage`], [`Identity`],
//!   [`Answer`], [`Reply`], [`BridgeItem`]) and the error taxonomy
//! - **Moderation**: [`ModerationGuard`], a per-sender sliding-window flood
//!   detector with temporary bans
//! - **Dispatch**: [`PluginDispatcher`] over ordered [`Responder`]s, first
//!   match wins
//! - **Bridge**: [`ExternalBridge`], a bounded FIFO through which other tasks
//!   inject broadcasts
//! - **Boundaries**: [`PlatformConnection`] and [`Transcript`]
//!
//! ```text
//! ┌──────────────┐   events   ┌───────────┐   check    ┌─────────────────┐
//! │   Platform   │──────────▶│   Relay   │──────────▶│ ModerationGuard │
//! │  Connection  │◀──────────│  (loop)   │──────────▶│ PluginDispatcher│
//! └──────────────┘ send/pin/  └───────────┘  dispatch  └─────────────────┘
//!                  restrict        ▲
//!                                  │ drain
//!                         ┌────────┴───────┐
//!                         │ ExternalBridge │◀── submit (many producers)
//!                         └────────────────┘
//! ```
//!
//! The relay itself lives in `herald-runtime`.

pub mod bridge;
pub mod dispatcher;
pub mod error;
pub mod foundation;
pub mod moderation;
pub mod platform;
pub mod transcript;

pub use bridge::{BridgeHandle, BridgeReceiver, DEFAULT_BRIDGE_CAPACITY, ExternalBridge, Submitter};
pub use dispatcher::{
    BoxedResponder, DEFAULT_RESPONDER_TIMEOUT, PluginDispatcher, Responder, contains_trigger,
    help_line,
};
pub use error::{
    BridgeError, BridgeResult, PlatformError, PlatformResult, ResponderError, ResponderResult,
    TranscriptError, TranscriptResult, TransformError,
};
pub use foundation::{
    Answer, BridgeItem, ChatTarget, Entity, Identity, Image, InboundMessage, MessageHandle, Reply,
    UserHandle,
};
pub use moderation::{ExcludeSet, GuardConfig, ModerationGuard, Verdict};
pub use platform::{PlatformConnection, PlatformSession, SendOptions};
pub use transcript::{NullTranscript, Transcript};

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::*;
    pub use super::{
        PluginDispatcher, Responder, ResponderError, ResponderResult, contains_trigger, help_line,
    };
}

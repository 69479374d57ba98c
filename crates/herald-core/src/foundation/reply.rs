//! What flows back out of the relay: responder answers and broadcasts.

use serde::{Deserialize, Serialize};

/// Text produced by a responder that matched a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Markdown text to post.
    pub text: String,
    /// Pin the posted message.
    #[serde(default)]
    pub pin: bool,
}

impl Answer {
    /// Creates an answer that is posted but not pinned.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pin: false,
        }
    }

    /// Marks the answer to be pinned after it is posted.
    pub fn pinned(mut self) -> Self {
        self.pin = true;
        self
    }
}

/// Result of a dispatch, consumed exactly once by the relay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// Text to post.
    pub text: String,
    /// Whether anything should be posted at all.
    pub send: bool,
    /// Whether the posted message should be pinned.
    pub pin: bool,
}

impl Reply {
    /// A reply that posts nothing.
    pub fn none() -> Self {
        Self::default()
    }
}

impl From<Answer> for Reply {
    fn from(answer: Answer) -> Self {
        Self {
            text: answer.text,
            send: true,
            pin: answer.pin,
        }
    }
}

/// A broadcast queued on the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeItem {
    /// Text to post.
    pub text: String,
    /// Pin the posted message.
    pub pin: bool,
}

impl BridgeItem {
    /// Creates a bridge item.
    pub fn new(text: impl Into<String>, pin: bool) -> Self {
        Self {
            text: text.into(),
            pin,
        }
    }
}

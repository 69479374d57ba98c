//! Message model shared by the platform, the relay and the responders.
//!
//! Everything here is produced once by a platform's transform step and then
//! only read. The types are serializable so the transcript recorder can
//! persist them verbatim.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Handles
// ============================================================================

/// Platform identifier of a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatTarget(pub i64);

impl fmt::Display for ChatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform identifier of a message, as returned by a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle(pub i64);

impl fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform identifier of a user, used for restrictions and mention links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserHandle(pub i64);

impl fmt::Display for UserHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Identity
// ============================================================================

/// Who sent a message.
///
/// Two identities are equal when their usernames are equal. Without a
/// username the platform handle decides, and only when neither is known the
/// display name does.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Identity {
    /// Username without the leading `@`, empty if the user has none.
    #[serde(default)]
    pub username: String,
    /// Human readable name.
    #[serde(default)]
    pub display_name: String,
    /// Platform handle of the user, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<UserHandle>,
}

impl Identity {
    /// Creates an identity from a username and display name.
    pub fn new(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: display_name.into(),
            handle: None,
        }
    }

    /// Attaches the platform handle.
    pub fn with_handle(mut self, handle: UserHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Returns `true` if the identity has a username.
    pub fn has_username(&self) -> bool {
        !self.username.is_empty()
    }

    fn key(&self) -> IdentityKey<'_> {
        match (self.has_username(), self.handle) {
            (true, _) => IdentityKey::Username(&self.username),
            (false, Some(handle)) => IdentityKey::Handle(handle),
            (false, None) => IdentityKey::Name(&self.display_name),
        }
    }
}

#[derive(PartialEq, Eq, Hash)]
enum IdentityKey<'a> {
    Username(&'a str),
    Handle(UserHandle),
    Name(&'a str),
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_username() {
            write!(f, "@{}", self.username)
        } else {
            f.write_str(&self.display_name)
        }
    }
}

// ============================================================================
// Formatting spans and media
// ============================================================================

/// A formatting span inside a message text (bold, link, mention, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Span kind as named by the platform, e.g. `bold`, `text_link`.
    pub kind: String,
    /// Offset of the span, in UTF-16 code units.
    pub offset: usize,
    /// Length of the span, in UTF-16 code units.
    pub length: usize,
    /// Link target for link spans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Mentioned user for mention spans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
}

/// An attached picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Platform file id of the largest available size.
    pub file_id: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Caption text.
    #[serde(default)]
    pub caption: String,
    /// Formatting spans of the caption.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<Entity>,
}

// ============================================================================
// InboundMessage
// ============================================================================

/// A chat message as seen by the relay and the responders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Platform message id.
    pub id: MessageHandle,
    /// Chat the message was posted in.
    pub chat: ChatTarget,
    /// When the platform says the message was sent.
    pub sent: DateTime<Utc>,
    /// Sender.
    pub from: Identity,
    /// Text body, empty for media-only messages.
    #[serde(default)]
    pub text: String,
    /// Formatting spans of the text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<Entity>,
    /// Attached picture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
}

impl InboundMessage {
    /// Creates a plain text message.
    pub fn new(
        id: MessageHandle,
        chat: ChatTarget,
        sent: DateTime<Utc>,
        from: Identity,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id,
            chat,
            sent,
            from,
            text: text.into(),
            entities: Vec::new(),
            image: None,
        }
    }

    /// Returns `true` if there is nothing for the relay to look at.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.entities.is_empty() && self.image.is_none()
    }

    /// The text body with surrounding whitespace removed.
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn identity_equality_prefers_username() {
        let a = Identity::new("umputun", "Umputun One");
        let b = Identity::new("umputun", "Another Name").with_handle(UserHandle(7));
        assert_eq!(a, b);

        let c = Identity::new("", "Umputun One");
        assert_ne!(a, c);
    }

    #[test]
    fn identity_without_username_compares_display_name() {
        let a = Identity::new("", "Bobuk");
        let b = Identity::new("", "Bobuk");
        let c = Identity::new("", "Ksenks");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn identity_without_username_prefers_handle() {
        let a = Identity::new("", "Alex").with_handle(UserHandle(1));
        let b = Identity::new("", "Alex").with_handle(UserHandle(2));
        let renamed = Identity::new("", "Alexander").with_handle(UserHandle(1));
        assert_ne!(a, b);
        assert_eq!(a, renamed);
        assert_ne!(a, Identity::new("", "Alex"));
    }

    #[test]
    fn identity_hash_agrees_with_equality() {
        let mut set = HashSet::new();
        set.insert(Identity::new("grayru", "Gray"));
        set.insert(Identity::new("grayru", "Gray R").with_handle(UserHandle(1)));
        set.insert(Identity::new("", "Gray"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn identity_display() {
        assert_eq!(Identity::new("alek_sys", "Alex").to_string(), "@alek_sys");
        assert_eq!(Identity::new("", "Alex").to_string(), "Alex");
    }

    #[test]
    fn empty_message_detection() {
        let from = Identity::new("user", "User");
        let mut msg = InboundMessage::new(
            MessageHandle(1),
            ChatTarget(-100),
            Utc::now(),
            from,
            "  ",
        );
        assert!(msg.is_empty());

        msg.image = Some(Image {
            file_id: "f1".into(),
            width: 10,
            height: 10,
            caption: String::new(),
            entities: Vec::new(),
        });
        assert!(!msg.is_empty());
    }

    #[test]
    fn message_serializes_without_empty_optionals() {
        let msg = InboundMessage::new(
            MessageHandle(5),
            ChatTarget(-1001),
            DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
            Identity::new("user", "User"),
            "hello",
        );
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("image").is_none());
        assert!(json.get("entities").is_none());
        assert_eq!(json["text"], "hello");

        let back: InboundMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }
}

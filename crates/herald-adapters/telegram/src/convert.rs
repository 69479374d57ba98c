//! Conversion from Bot API messages into the relay's message model.

use herald_core::{ChatTarget, Entity, Identity, Image, InboundMessage, MessageHandle, UserHandle};
use teloxide::types::{Message, MessageEntity, MessageEntityKind, User};

/// Builds an [`Identity`] from a Bot API user.
pub fn identity(user: &User) -> Identity {
    let identity = Identity::new(user.username.clone().unwrap_or_default(), user.full_name());
    match i64::try_from(user.id.0) {
        Ok(id) => identity.with_handle(UserHandle(id)),
        Err(_) => identity,
    }
}

/// Converts a message. Infallible: every Bot API message has a chat.
pub fn message(msg: &Message) -> InboundMessage {
    let from = match (&msg.from, &msg.sender_chat) {
        (Some(user), _) => identity(user),
        (None, Some(chat)) => Identity::new(
            chat.username().unwrap_or_default(),
            chat.title().unwrap_or_default(),
        ),
        (None, None) => Identity::default(),
    };

    let mut out = InboundMessage::new(
        MessageHandle(i64::from(msg.id.0)),
        ChatTarget(msg.chat.id.0),
        msg.date,
        from,
        msg.text().unwrap_or_default(),
    );

    match (msg.entities(), msg.photo()) {
        (Some(entities), _) if !entities.is_empty() => {
            out.entities = entities.iter().map(entity).collect();
        }
        (_, Some(sizes)) => {
            if let Some(largest) = sizes.last() {
                out.image = Some(Image {
                    file_id: largest.file.id.clone(),
                    width: largest.width,
                    height: largest.height,
                    caption: msg.caption().unwrap_or_default().to_string(),
                    entities: msg
                        .caption_entities()
                        .map(|e| e.iter().map(entity).collect())
                        .unwrap_or_default(),
                });
            }
        }
        _ => {}
    }

    out
}

fn entity(e: &MessageEntity) -> Entity {
    let (url, user) = match &e.kind {
        MessageEntityKind::TextLink { url } => (Some(url.to_string()), None),
        MessageEntityKind::TextMention { user } => (None, Some(identity(user))),
        _ => (None, None),
    };

    Entity {
        kind: entity_kind(&e.kind),
        offset: e.offset,
        length: e.length,
        url,
        user,
    }
}

/// Bot API name of an entity kind, e.g. `bold` or `text_link`.
fn entity_kind(kind: &MessageEntityKind) -> String {
    serde_json::to_value(kind)
        .ok()
        .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(String::from))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Markdown mention of `who`: `@username`, or an inline user link when the
/// user has no username.
pub fn mention(who: &Identity) -> String {
    match (who.has_username(), who.handle) {
        (true, _) => format!("@{}", who.username),
        (false, Some(handle)) => format!("[{}](tg://user?id={})", who.display_name, handle),
        (false, None) => who.display_name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: serde_json::Value) -> Message {
        serde_json::from_value(value).unwrap()
    }

    fn base(extra: serde_json::Value) -> serde_json::Value {
        let mut msg = json!({
            "message_id": 17,
            "date": 1_600_000_000,
            "chat": { "id": -1001, "type": "supergroup", "title": "Radio-T" },
            "from": {
                "id": 1001,
                "is_bot": false,
                "first_name": "Alice",
                "last_name": "Smith",
                "username": "alice"
            }
        });
        if let (Some(m), Some(e)) = (msg.as_object_mut(), extra.as_object()) {
            m.extend(e.clone());
        }
        msg
    }

    #[test]
    fn converts_text_message() {
        let msg = message(&parse(base(json!({ "text": "hello" }))));

        assert_eq!(msg.id, MessageHandle(17));
        assert_eq!(msg.chat, ChatTarget(-1001));
        assert_eq!(msg.sent.timestamp(), 1_600_000_000);
        assert_eq!(msg.text, "hello");
        assert_eq!(msg.from.username, "alice");
        assert_eq!(msg.from.display_name, "Alice Smith");
        assert_eq!(msg.from.handle, Some(UserHandle(1001)));
        assert!(msg.entities.is_empty());
        assert!(msg.image.is_none());
    }

    #[test]
    fn converts_entities() {
        let msg = message(&parse(base(json!({
            "text": "see docs, bold",
            "entities": [
                { "type": "text_link", "offset": 4, "length": 4, "url": "https://example.com/" },
                { "type": "bold", "offset": 10, "length": 4 }
            ]
        }))));

        assert_eq!(msg.entities.len(), 2);
        assert_eq!(msg.entities[0].kind, "text_link");
        assert_eq!(msg.entities[0].url.as_deref(), Some("https://example.com/"));
        assert_eq!(msg.entities[1].kind, "bold");
        assert_eq!((msg.entities[1].offset, msg.entities[1].length), (10, 4));
    }

    #[test]
    fn converts_largest_photo_with_caption() {
        let msg = message(&parse(base(json!({
            "caption": "look",
            "caption_entities": [ { "type": "italic", "offset": 0, "length": 4 } ],
            "photo": [
                { "file_id": "small", "file_unique_id": "s", "width": 90, "height": 60 },
                { "file_id": "large", "file_unique_id": "l", "width": 1280, "height": 853 }
            ]
        }))));

        assert!(!msg.is_empty());
        let image = msg.image.expect("image");
        assert_eq!(image.file_id, "large");
        assert_eq!((image.width, image.height), (1280, 853));
        assert_eq!(image.caption, "look");
        assert_eq!(image.entities[0].kind, "italic");
    }

    #[test]
    fn message_without_content_is_empty() {
        let msg = message(&parse(base(json!({
            "new_chat_members": [ { "id": 5, "is_bot": false, "first_name": "Bob" } ]
        }))));
        assert!(msg.is_empty());
    }

    #[test]
    fn mention_prefers_username() {
        let with = Identity::new("alice", "Alice").with_handle(UserHandle(1));
        let without = Identity::new("", "Bob Jones").with_handle(UserHandle(42));
        assert_eq!(mention(&with), "@alice");
        assert_eq!(mention(&without), "[Bob Jones](tg://user?id=42)");
        assert_eq!(mention(&Identity::new("", "Ghost")), "Ghost");
    }
}

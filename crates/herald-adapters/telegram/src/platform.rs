//! [`PlatformConnection`] over the Telegram Bot API.
//!
//! Updates are fetched by a manual long-polling task; every `Message`
//! update is forwarded into the session's event stream. The stream ends when
//! the polling task stops, which the relay treats as a lost connection.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use herald_core::{
    ChatTarget, Identity, InboundMessage, MessageHandle, PlatformConnection, PlatformError,
    PlatformResult, PlatformSession, SendOptions, TransformError, UserHandle,
};
use teloxide::prelude::*;
use teloxide::types::{
    AllowedUpdate, ChatPermissions, LinkPreviewOptions, MessageId, ParseMode, Recipient,
    UpdateKind,
};
use teloxide::{ApiError, RequestError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{GroupRef, TelegramConfig};
use crate::convert;

/// Pending updates buffered between the poller and the relay.
const EVENT_BUFFER: usize = 256;

/// Pause after a failed `getUpdates`.
const POLL_BACKOFF: Duration = Duration::from_secs(5);

/// Telegram platform connection.
pub struct TelegramPlatform {
    bot: Bot,
    config: TelegramConfig,
    shutdown: CancellationToken,
}

impl TelegramPlatform {
    /// Creates the connection. Nothing is sent until [`open`](PlatformConnection::open).
    ///
    /// `shutdown` stops the polling task.
    pub fn new(config: TelegramConfig, shutdown: CancellationToken) -> PlatformResult<Self> {
        // the HTTP timeout has to outlive the long-poll timeout
        let client = teloxide::net::default_reqwest_settings()
            .timeout(config.poll_timeout() + Duration::from_secs(15))
            .build()
            .map_err(|e| PlatformError::handshake(e.to_string()))?;

        let mut bot = Bot::with_client(config.token.clone(), client);
        if let Some(url) = &config.api_url {
            let url = reqwest::Url::parse(url)
                .map_err(|e| PlatformError::handshake(format!("invalid api_url {url}: {e}")))?;
            bot = bot.set_api_url(url);
        }

        Ok(Self {
            bot,
            config,
            shutdown,
        })
    }

    async fn resolve_group(&self) -> PlatformResult<ChatTarget> {
        match self.config.group_ref() {
            GroupRef::Id(id) => Ok(ChatTarget(id)),
            GroupRef::Username(name) => {
                let chat = self
                    .bot
                    .get_chat(Recipient::ChannelUsername(name.clone()))
                    .await
                    .map_err(|e| PlatformError::ChatNotFound {
                        chat: name,
                        reason: e.to_string(),
                    })?;
                Ok(ChatTarget(chat.id.0))
            }
        }
    }
}

#[async_trait]
impl PlatformConnection for TelegramPlatform {
    type Event = Message;

    async fn open(&self) -> PlatformResult<PlatformSession<Message>> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| PlatformError::handshake(e.to_string()))?;

        // long polling does not work while a webhook is set
        self.bot
            .delete_webhook()
            .send()
            .await
            .map_err(|e| PlatformError::handshake(e.to_string()))?;

        let home_chat = self.resolve_group().await?;
        info!(
            bot = ?me.username,
            group = %self.config.group_ref(),
            chat = %home_chat,
            "Telegram bot connected"
        );

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(poll_updates(
            self.bot.clone(),
            self.config.poll_timeout_secs,
            tx,
            self.shutdown.clone(),
        ));

        let events = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        })
        .boxed();

        Ok(PlatformSession { home_chat, events })
    }

    fn transform(&self, event: &Message) -> Result<Option<InboundMessage>, TransformError> {
        Ok(Some(convert::message(event)))
    }

    fn mention(&self, who: &Identity) -> String {
        convert::mention(who)
    }

    async fn send(
        &self,
        chat: ChatTarget,
        text: &str,
        options: SendOptions,
    ) -> PlatformResult<InboundMessage> {
        let mut req = self.bot.send_message(ChatId(chat.0), text);
        if options.markdown {
            req = req.parse_mode(ParseMode::Markdown);
        }
        if options.disable_link_preview {
            req = req.link_preview_options(LinkPreviewOptions {
                is_disabled: true,
                url: None,
                prefer_small_media: false,
                prefer_large_media: false,
                show_above_text: false,
            });
        }

        let sent = req
            .await
            .map_err(|e| PlatformError::SendFailed(e.to_string()))?;
        Ok(convert::message(&sent))
    }

    async fn pin(&self, chat: ChatTarget, message: MessageHandle) -> PlatformResult<()> {
        let id = i32::try_from(message.0)
            .map_err(|_| PlatformError::PinFailed(format!("message id {message} out of range")))?;
        self.bot
            .pin_chat_message(ChatId(chat.0), MessageId(id))
            .await
            .map_err(|e| PlatformError::PinFailed(e.to_string()))?;
        Ok(())
    }

    async fn restrict(
        &self,
        chat: ChatTarget,
        user: UserHandle,
        until: DateTime<Utc>,
    ) -> PlatformResult<()> {
        let id = u64::try_from(user.0)
            .map_err(|_| PlatformError::RestrictFailed(format!("invalid user id {user}")))?;
        self.bot
            .restrict_chat_member(ChatId(chat.0), UserId(id), ChatPermissions::empty())
            .until_date(until)
            .await
            .map_err(|e| PlatformError::RestrictFailed(e.to_string()))?;
        Ok(())
    }
}

/// Long-polls `getUpdates` and forwards messages until cancelled, until the
/// receiver is gone, or until another instance takes over the token.
async fn poll_updates(
    bot: Bot,
    timeout_secs: u32,
    tx: mpsc::Sender<Message>,
    shutdown: CancellationToken,
) {
    info!("Telegram polling started");
    let mut offset: i32 = 0;

    loop {
        let result = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            r = bot
                .get_updates()
                .offset(offset)
                .timeout(timeout_secs)
                .allowed_updates(vec![AllowedUpdate::Message]) => r,
        };

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "Got telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    match update.kind {
                        UpdateKind::Message(msg) => {
                            if tx.send(msg).await.is_err() {
                                info!("Event receiver gone, polling stopped");
                                return;
                            }
                        }
                        other => debug!("Ignoring non-message update: {other:?}"),
                    }
                }
            }
            Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                warn!("Another instance is polling with this token, polling stopped");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Telegram getUpdates failed");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(POLL_BACKOFF) => {}
                }
            }
        }
    }

    info!("Telegram polling stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::Bytes;
    use axum::extract::State;
    use axum::http::Uri;
    use axum::routing::post;
    use parking_lot::Mutex;
    use serde_json::{Value, json};

    use super::*;

    type Captured = Arc<Mutex<Vec<(String, Value)>>>;

    async fn api_handler(State(captured): State<Captured>, uri: Uri, body: Bytes) -> axum::Json<Value> {
        // teloxide posts to `/SendMessage`, the Bot API docs say `sendMessage`
        let method = uri
            .path()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        captured.lock().push((method.clone(), body.clone()));

        let result = match method.as_str() {
            "sendmessage" => json!({
                "message_id": 77,
                "date": 1_600_000_000,
                "chat": { "id": body["chat_id"], "type": "supergroup", "title": "Radio-T" },
                "from": { "id": 1, "is_bot": true, "first_name": "herald", "username": "herald_bot" },
                "text": body["text"]
            }),
            "getchat" => json!({
                "id": -100500,
                "type": "supergroup",
                "title": "Radio-T",
                "accent_color_id": 0,
                "max_reaction_count": 11
            }),
            _ => json!(true),
        };
        axum::Json(json!({ "ok": true, "result": result }))
    }

    async fn mock_platform(group: &str) -> (TelegramPlatform, Captured) {
        let captured: Captured = Arc::default();
        let app = Router::new()
            .route("/{*path}", post(api_handler))
            .with_state(Arc::clone(&captured));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = TelegramConfig {
            token: "test-token".into(),
            group: group.into(),
            api_url: Some(format!("http://{addr}/")),
            ..TelegramConfig::default()
        };
        let platform = TelegramPlatform::new(config, CancellationToken::new()).unwrap();
        (platform, captured)
    }

    #[tokio::test]
    async fn send_uses_markdown_without_previews() {
        let (platform, captured) = mock_platform("-100500").await;
        let sent = platform
            .send(ChatTarget(-100500), "*hi*", SendOptions::reply())
            .await
            .unwrap();

        assert_eq!(sent.id, MessageHandle(77));
        assert_eq!(sent.chat, ChatTarget(-100500));
        assert_eq!(sent.from.username, "herald_bot");

        let calls = captured.lock();
        let (method, body) = &calls[0];
        assert_eq!(method, "sendmessage");
        assert_eq!(body["parse_mode"], "Markdown");
        assert_eq!(body["link_preview_options"]["is_disabled"], true);
    }

    #[tokio::test]
    async fn broadcast_keeps_previews() {
        let (platform, captured) = mock_platform("-100500").await;
        platform
            .send(ChatTarget(-100500), "news", SendOptions::broadcast())
            .await
            .unwrap();

        let calls = captured.lock();
        assert!(calls[0].1.get("link_preview_options").is_none());
    }

    #[tokio::test]
    async fn pin_and_restrict_hit_the_api() {
        let (platform, captured) = mock_platform("-100500").await;
        platform
            .pin(ChatTarget(-100500), MessageHandle(77))
            .await
            .unwrap();
        let until = DateTime::from_timestamp(1_700_000_600, 0).unwrap();
        platform
            .restrict(ChatTarget(-100500), UserHandle(1001), until)
            .await
            .unwrap();

        let calls = captured.lock();
        assert_eq!(calls[0].0, "pinchatmessage");
        assert_eq!(calls[0].1["message_id"], 77);
        assert_eq!(calls[1].0, "restrictchatmember");
        assert_eq!(calls[1].1["user_id"], 1001);
        assert_eq!(calls[1].1["until_date"], 1_700_000_600);
        assert!(calls[1].1["permissions"].is_object());
    }

    #[tokio::test]
    async fn group_username_is_resolved() {
        let (platform, captured) = mock_platform("radio_t_chat").await;
        assert_eq!(platform.resolve_group().await.unwrap(), ChatTarget(-100500));
        assert_eq!(captured.lock()[0].1["chat_id"], "@radio_t_chat");
    }

    #[tokio::test]
    async fn numeric_group_needs_no_lookup() {
        let (platform, captured) = mock_platform("-42").await;
        assert_eq!(platform.resolve_group().await.unwrap(), ChatTarget(-42));
        assert!(captured.lock().is_empty());
    }

    #[test]
    fn invalid_api_url_is_rejected() {
        let config = TelegramConfig {
            api_url: Some("not a url".into()),
            ..TelegramConfig::default()
        };
        assert!(TelegramPlatform::new(config, CancellationToken::new()).is_err());
    }
}

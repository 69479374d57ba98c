//! Jokes fetched from the web.
//!
//! `анекдот!` and `joke!` pull a random Russian joke from an endpoint that
//! answers with Windows-1251 encoded, almost-JSON text; `chuck!` reads a
//! JSON document with the joke under `value.joke`.

use async_trait::async_trait;
use encoding_rs::WINDOWS_1251;
use herald_core::prelude::*;
use herald_transport::HttpClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Triggers for the Russian joke source.
pub const ANECDOTE_TRIGGERS: &[&str] = &["анекдот!", "анкедот!", "joke!"];

/// Trigger for the Chuck Norris source.
pub const CHUCK_TRIGGER: &str = "chuck!";

/// Endpoints used by [`Anecdote`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnecdoteConfig {
    /// Source of Windows-1251 jokes.
    pub anecdote_url: String,
    /// Source of Chuck Norris jokes.
    pub chuck_url: String,
}

impl Default for AnecdoteConfig {
    fn default() -> Self {
        Self {
            anecdote_url: "http://rzhunemogu.ru/RandJSON.aspx?CType=1".into(),
            chuck_url: "http://api.icndb.com/jokes/random".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChuckResponse {
    value: ChuckValue,
}

#[derive(Debug, Deserialize)]
struct ChuckValue {
    joke: String,
}

/// Fetches a joke on request.
pub struct Anecdote {
    client: HttpClient,
    config: AnecdoteConfig,
}

impl Anecdote {
    /// Creates the responder on top of a shared client.
    pub fn new(client: HttpClient, config: AnecdoteConfig) -> Self {
        info!(
            anecdote = %config.anecdote_url,
            chuck = %config.chuck_url,
            "Anecdote responder ready"
        );
        Self { client, config }
    }

    async fn anecdote(&self) -> ResponderResult<String> {
        let url = &self.config.anecdote_url;
        let body = self
            .client
            .get_bytes(url)
            .await
            .map_err(|e| ResponderError::upstream(url.as_str(), e.to_string()))?;
        decode_anecdote(&body)
    }

    async fn chuck(&self) -> ResponderResult<String> {
        let url = &self.config.chuck_url;
        let body = self
            .client
            .get_bytes(url)
            .await
            .map_err(|e| ResponderError::upstream(url.as_str(), e.to_string()))?;
        decode_chuck(&body)
    }
}

/// Extracts the joke from a `{"content":"..."}` payload in Windows-1251.
///
/// The payload is not valid JSON (raw line breaks inside the string), so
/// the wrapper is stripped by hand.
pub fn decode_anecdote(body: &[u8]) -> ResponderResult<String> {
    let (text, _, had_errors) = WINDOWS_1251.decode(body);
    if had_errors {
        debug!("Anecdote payload had undecodable bytes");
    }

    let text = text.trim();
    let text = text.strip_prefix(r#"{"content":""#).unwrap_or(text);
    let text = text.strip_suffix(r#""}"#).unwrap_or(text);
    let text = text.trim();

    if text.is_empty() {
        return Err(ResponderError::payload("empty anecdote"));
    }
    Ok(text.to_string())
}

/// Extracts the joke from a Chuck Norris JSON payload.
pub fn decode_chuck(body: &[u8]) -> ResponderResult<String> {
    let resp: ChuckResponse = serde_json::from_slice(body)?;
    Ok(format!("- {}", resp.value.joke.replace("&quot;", "\"")))
}

#[async_trait]
impl Responder for Anecdote {
    fn name(&self) -> &str {
        "anecdote"
    }

    fn react_on(&self) -> Vec<String> {
        ANECDOTE_TRIGGERS
            .iter()
            .chain(std::iter::once(&CHUCK_TRIGGER))
            .map(|s| s.to_string())
            .collect()
    }

    async fn on_message(&self, msg: &InboundMessage) -> ResponderResult<Option<Answer>> {
        let text = msg.trimmed_text();

        let joke = if contains_trigger(&[CHUCK_TRIGGER], text) {
            self.chuck().await?
        } else if contains_trigger(ANECDOTE_TRIGGERS, text) {
            self.anecdote().await?
        } else {
            return Ok(None);
        };

        Ok(Some(Answer::text(joke)))
    }

    fn help(&self) -> String {
        help_line(&self.react_on(), "расскажет анекдот")
    }
}

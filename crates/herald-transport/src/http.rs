//! Shared HTTP client used by responders that fetch from the web.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use tracing::debug;

use crate::error::{TransportError, TransportResult};

/// Per-request timeout used when none is given.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// A cloneable HTTP client with a fixed request timeout.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with the default timeout.
    pub fn new() -> TransportResult<Self> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Creates a client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> TransportResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    /// Fetches `url` and returns the raw body.
    ///
    /// A non-success status is an error.
    pub async fn get_bytes(&self, url: &str) -> TransportResult<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::request(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::request(url, e))?;
        debug!(url = %url, size = body.len(), "Fetched");
        Ok(body.to_vec())
    }
}

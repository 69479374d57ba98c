//! Line-oriented broadcast listener.
//!
//! Accepts plain TCP connections; each connection delivers one
//! newline-terminated line which is submitted to the bridge. Connections are
//! served one at a time so broadcasts keep their arrival order.
//!
//! ```text
//! news feed ──tcp──▶ LineListener ──submit──▶ ExternalBridge ──▶ relay
//! ```
//!
//! A line matching one of the configured pinned phrases (case-insensitive)
//! is submitted with `pin = true`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use herald_core::Submitter;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{TransportError, TransportResult};

/// Phrases pinned when no list is configured.
pub const DEFAULT_PINNED: &[&str] = &[" --> Официальный кат!"];

/// Delay after a failed accept.
const ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Upper bound for a single line.
const MAX_LINE: usize = 64 * 1024;

/// Listener settings.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Address to bind, e.g. `0.0.0.0:18001`.
    pub addr: String,
    /// Lines that are pinned after posting.
    pub pinned: Vec<String>,
    /// How long a client may take to deliver its line.
    pub read_timeout: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:18001".into(),
            pinned: DEFAULT_PINNED.iter().map(|s| s.to_string()).collect(),
            read_timeout: Duration::from_secs(10),
        }
    }
}

/// A bound broadcast listener.
#[derive(Debug)]
pub struct LineListener {
    listener: TcpListener,
    pinned: Vec<String>,
    read_timeout: Duration,
}

impl LineListener {
    /// Binds the configured address.
    pub async fn bind(config: ListenerConfig) -> TransportResult<Self> {
        let listener = TcpListener::bind(&config.addr)
            .await
            .map_err(|e| TransportError::Bind {
                addr: config.addr.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            listener,
            pinned: config.pinned,
            read_timeout: config.read_timeout,
        })
    }

    /// The address actually bound.
    pub fn local_addr(&self) -> TransportResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Returns `true` if `line` is one of the pinned phrases.
    pub fn is_pinned(&self, line: &str) -> bool {
        let line = line.to_lowercase();
        self.pinned.iter().any(|p| p.to_lowercase() == line)
    }

    /// Serves connections until `cancel` fires.
    ///
    /// Submissions use `cancel` as their context, so a listener blocked on a
    /// full bridge stops promptly too.
    pub async fn run(self, submitter: Arc<dyn Submitter>, cancel: CancellationToken) {
        let addr = self
            .listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_default();
        info!(addr = %addr, "Broadcast listener started");

        loop {
            let accepted = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };

            let (stream, peer) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "Can't accept connection");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(ACCEPT_BACKOFF) => continue,
                    }
                }
            };

            let line = match tokio::time::timeout(self.read_timeout, read_line(stream)).await {
                Ok(Ok(Some(line))) => line,
                Ok(Ok(None)) => {
                    debug!(peer = %peer, "Connection closed without a line");
                    continue;
                }
                Ok(Err(e)) => {
                    warn!(peer = %peer, error = %e, "Can't read message");
                    continue;
                }
                Err(_) => {
                    warn!(peer = %peer, "Timed out reading message");
                    continue;
                }
            };

            let pin = self.is_pinned(&line);
            debug!(peer = %peer, pin, "Broadcast received");
            if let Err(e) = submitter.submit(&cancel, line, pin).await {
                warn!(error = %e, "Can't submit broadcast");
            }
        }

        info!(addr = %addr, "Broadcast listener stopped");
    }
}

/// Reads one line, without its terminator. `None` if the peer sent nothing.
///
/// A line that hits [`MAX_LINE`] before its terminator is rejected rather
/// than posted cut short.
async fn read_line(stream: TcpStream) -> std::io::Result<Option<String>> {
    let mut reader = BufReader::new(stream).take(MAX_LINE as u64);
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Ok(None);
    }
    if n == MAX_LINE && !line.ends_with('\n') {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("line longer than {MAX_LINE} bytes"),
        ));
    }
    let trimmed = line.trim_end_matches(['\n', '\r']);
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use herald_core::{BridgeError, BridgeResult, BridgeItem};
    use parking_lot::Mutex;
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[derive(Default)]
    struct Recording {
        items: Mutex<Vec<BridgeItem>>,
        notify: tokio::sync::Notify,
    }

    #[async_trait]
    impl Submitter for Recording {
        async fn submit(&self, ctx: &CancellationToken, text: String, pin: bool) -> BridgeResult<()> {
            if ctx.is_cancelled() {
                return Err(BridgeError::Cancelled);
            }
            self.items.lock().push(BridgeItem::new(text, pin));
            self.notify.notify_one();
            Ok(())
        }
    }

    fn config() -> ListenerConfig {
        ListenerConfig {
            addr: "127.0.0.1:0".into(),
            ..ListenerConfig::default()
        }
    }

    async fn send_line(addr: SocketAddr, data: &str) {
        let mut conn = TcpStream::connect(addr).await.unwrap();
        conn.write_all(data.as_bytes()).await.unwrap();
        conn.shutdown().await.unwrap();
    }

    async fn wait_for(rec: &Recording, n: usize) {
        while rec.items.lock().len() < n {
            rec.notify.notified().await;
        }
    }

    #[tokio::test]
    async fn lines_are_submitted_in_order() {
        let listener = LineListener::bind(config()).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let rec = Arc::new(Recording::default());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(listener.run(rec.clone(), cancel.clone()));

        send_line(addr, "first news\n").await;
        send_line(addr, "second news\r\n").await;
        wait_for(&rec, 2).await;

        assert_eq!(
            *rec.items.lock(),
            vec![
                BridgeItem::new("first news", false),
                BridgeItem::new("second news", false)
            ]
        );

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn pinned_phrase_is_pinned_regardless_of_case() {
        let listener = LineListener::bind(config()).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let rec = Arc::new(Recording::default());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(listener.run(rec.clone(), cancel.clone()));

        send_line(addr, " --> ОФИЦИАЛЬНЫЙ кат!\n").await;
        wait_for(&rec, 1).await;
        assert!(rec.items.lock()[0].pin);

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn empty_connections_are_ignored() {
        let listener = LineListener::bind(config()).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let rec = Arc::new(Recording::default());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(listener.run(rec.clone(), cancel.clone()));

        send_line(addr, "").await;
        send_line(addr, "\n").await;
        send_line(addr, "real one\n").await;
        wait_for(&rec, 1).await;
        assert_eq!(rec.items.lock().len(), 1);
        assert_eq!(rec.items.lock()[0].text, "real one");

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn oversized_line_is_dropped() {
        let listener = LineListener::bind(config()).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let rec = Arc::new(Recording::default());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(listener.run(rec.clone(), cancel.clone()));

        // the listener hangs up mid-write, so write errors are expected
        let huge = format!("{}\n", "x".repeat(MAX_LINE + 16));
        let mut conn = TcpStream::connect(addr).await.unwrap();
        let _ = conn.write_all(huge.as_bytes()).await;
        let _ = conn.shutdown().await;
        drop(conn);

        send_line(addr, "after the flood\n").await;
        wait_for(&rec, 1).await;
        assert_eq!(
            *rec.items.lock(),
            vec![BridgeItem::new("after the flood", false)]
        );

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let taken = LineListener::bind(config()).await.unwrap();
        let addr = taken.local_addr().unwrap();

        let err = LineListener::bind(ListenerConfig {
            addr: addr.to_string(),
            ..ListenerConfig::default()
        })
        .await
        .unwrap_err();
        assert!(matches!(err, TransportError::Bind { .. }));
    }

    #[test]
    fn default_config_pins_the_official_phrase() {
        let cfg = ListenerConfig::default();
        assert_eq!(cfg.pinned, vec![" --> Официальный кат!".to_string()]);
    }
}

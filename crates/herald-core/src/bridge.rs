//! Bounded broadcast queue from external producers into the relay.
//!
//! Producers hold a cloneable [`BridgeHandle`] and call
//! [`submit`](BridgeHandle::submit); the relay owns the single
//! [`BridgeReceiver`] and drains items in FIFO order. A full queue makes
//! `submit` wait until there is room or until the caller's token (or the
//! bridge shutdown token) is cancelled.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::{BridgeError, BridgeResult};
use crate::foundation::BridgeItem;

/// Queue capacity used when none is configured.
pub const DEFAULT_BRIDGE_CAPACITY: usize = 100;

/// Constructor namespace for the bridge pair.
pub struct ExternalBridge;

impl ExternalBridge {
    /// Creates a bridge with room for `capacity` pending items.
    ///
    /// Cancelling `shutdown` makes every pending and future submit fail with
    /// [`BridgeError::Cancelled`].
    pub fn channel(capacity: usize, shutdown: CancellationToken) -> (BridgeHandle, BridgeReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (BridgeHandle { tx, shutdown }, BridgeReceiver { rx })
    }
}

// =============================================================================
// Producer side
// =============================================================================

/// Producer side of the bridge. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    tx: mpsc::Sender<BridgeItem>,
    shutdown: CancellationToken,
}

impl BridgeHandle {
    /// Enqueues a broadcast, waiting for room if the queue is full.
    ///
    /// Returns [`BridgeError::Cancelled`] if `ctx` or the bridge shutdown
    /// token fires first, and [`BridgeError::Closed`] once the receiver is
    /// gone. An already cancelled token fails without enqueuing.
    pub async fn submit(
        &self,
        ctx: &CancellationToken,
        text: impl Into<String>,
        pin: bool,
    ) -> BridgeResult<()> {
        if ctx.is_cancelled() || self.shutdown.is_cancelled() {
            return Err(BridgeError::Cancelled);
        }

        let item = BridgeItem::new(text, pin);
        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(BridgeError::Cancelled),
            _ = self.shutdown.cancelled() => Err(BridgeError::Cancelled),
            sent = self.tx.send(item) => {
                sent.map_err(|_| BridgeError::Closed)?;
                trace!(pending = self.pending(), "Bridge item queued");
                Ok(())
            }
        }
    }

    /// Number of items waiting in the queue.
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Returns `true` once the receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Anything that accepts broadcasts for the relay.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Queues `text` for posting, optionally pinned.
    async fn submit(&self, ctx: &CancellationToken, text: String, pin: bool) -> BridgeResult<()>;
}

#[async_trait]
impl Submitter for BridgeHandle {
    async fn submit(&self, ctx: &CancellationToken, text: String, pin: bool) -> BridgeResult<()> {
        BridgeHandle::submit(self, ctx, text, pin).await
    }
}

// =============================================================================
// Consumer side
// =============================================================================

/// Consumer side of the bridge, owned by the relay.
#[derive(Debug)]
pub struct BridgeReceiver {
    rx: mpsc::Receiver<BridgeItem>,
}

impl BridgeReceiver {
    /// Waits for the next item. `None` once every handle is dropped and the
    /// queue is empty.
    pub async fn drain(&mut self) -> Option<BridgeItem> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn items_come_out_in_submission_order() {
        let (handle, mut rx) = ExternalBridge::channel(8, CancellationToken::new());
        let ctx = CancellationToken::new();

        handle.submit(&ctx, "first", false).await.unwrap();
        handle.submit(&ctx, "second", true).await.unwrap();

        assert_eq!(rx.drain().await, Some(BridgeItem::new("first", false)));
        assert_eq!(rx.drain().await, Some(BridgeItem::new("second", true)));
        drop(handle);
        assert_eq!(rx.drain().await, None);
    }

    #[tokio::test]
    async fn cancelled_context_fails_fast() {
        let (handle, mut rx) = ExternalBridge::channel(8, CancellationToken::new());
        let ctx = CancellationToken::new();
        ctx.cancel();

        assert_eq!(handle.submit(&ctx, "x", false).await, Err(BridgeError::Cancelled));
        drop(handle);
        assert_eq!(rx.drain().await, None);
    }

    #[tokio::test]
    async fn shutdown_fails_submit() {
        let shutdown = CancellationToken::new();
        let (handle, _rx) = ExternalBridge::channel(8, shutdown.clone());
        shutdown.cancel();

        let ctx = CancellationToken::new();
        assert_eq!(handle.submit(&ctx, "x", false).await, Err(BridgeError::Cancelled));
    }

    #[tokio::test]
    async fn full_queue_blocks_until_cancelled() {
        let (handle, _rx) = ExternalBridge::channel(1, CancellationToken::new());
        let ctx = CancellationToken::new();
        handle.submit(&ctx, "fills the queue", false).await.unwrap();
        assert_eq!(handle.pending(), 1);

        let blocked = {
            let handle = handle.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move { handle.submit(&ctx, "waits", false).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!blocked.is_finished());

        ctx.cancel();
        assert_eq!(blocked.await.unwrap(), Err(BridgeError::Cancelled));
    }

    #[tokio::test]
    async fn full_queue_unblocks_when_drained() {
        let (handle, mut rx) = ExternalBridge::channel(1, CancellationToken::new());
        let ctx = CancellationToken::new();
        handle.submit(&ctx, "one", false).await.unwrap();

        let waiting = {
            let handle = handle.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move { handle.submit(&ctx, "two", false).await })
        };

        assert_eq!(rx.drain().await.map(|i| i.text), Some("one".to_string()));
        assert_eq!(waiting.await.unwrap(), Ok(()));
        assert_eq!(rx.drain().await.map(|i| i.text), Some("two".to_string()));
    }

    #[tokio::test]
    async fn dropped_receiver_closes_bridge() {
        let (handle, rx) = ExternalBridge::channel(4, CancellationToken::new());
        drop(rx);

        assert!(handle.is_closed());
        let ctx = CancellationToken::new();
        assert_eq!(handle.submit(&ctx, "x", false).await, Err(BridgeError::Closed));
    }

    #[tokio::test]
    async fn concurrent_producers_lose_nothing() {
        let (handle, mut rx) = ExternalBridge::channel(4, CancellationToken::new());
        let ctx = CancellationToken::new();
        let submitter: Arc<dyn Submitter> = Arc::new(handle);

        let mut tasks = Vec::new();
        for p in 0..4 {
            let submitter = Arc::clone(&submitter);
            let ctx = ctx.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..25 {
                    submitter.submit(&ctx, format!("{p}-{i}"), false).await.unwrap();
                }
            }));
        }
        drop(submitter);

        let mut received = Vec::new();
        while let Some(item) = rx.drain().await {
            received.push(item.text);
        }
        for t in tasks {
            t.await.unwrap();
        }

        assert_eq!(received.len(), 100);
        for p in 0..4 {
            let own: Vec<_> = received
                .iter()
                .filter(|t| t.starts_with(&format!("{p}-")))
                .cloned()
                .collect();
            let expected: Vec<_> = (0..25).map(|i| format!("{p}-{i}")).collect();
            assert_eq!(own, expected);
        }
    }
}

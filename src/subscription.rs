use crate::aggregator::types::SlotUpdate;
use crate::errors::FetchError;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use solana_client::nonblocking::pubsub_client::PubsubClient;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub type SlotCallback = Arc<dyn Fn(SlotUpdate) + Send + Sync>;

/// Source of slot-change events
#[async_trait]
pub trait SlotTransport: Send + Sync {
    fn name(&self) -> &str;

    /// Forward events to `on_slot` in arrival order until `shutdown` is
    /// notified (Ok) or the stream ends or breaks (Err)
    async fn stream_slots(&self, on_slot: SlotCallback, shutdown: Arc<Notify>) -> Result<(), FetchError>;
}

/// `slotSubscribe` over the cluster websocket
pub struct PubsubTransport {
    ws_url: String,
}

impl PubsubTransport {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }
}

#[async_trait]
impl SlotTransport for PubsubTransport {
    fn name(&self) -> &str {
        &self.ws_url
    }

    async fn stream_slots(&self, on_slot: SlotCallback, shutdown: Arc<Notify>) -> Result<(), FetchError> {
        let client = PubsubClient::new(&self.ws_url)
            .await
            .map_err(|e| FetchError::unavailable("slot_subscription", e))?;
        let (mut stream, unsubscribe) = client
            .slot_subscribe()
            .await
            .map_err(|e| FetchError::unavailable("slot_subscription", e))?;

        let result = loop {
            tokio::select! {
                _ = shutdown.notified() => break Ok(()),
                next = stream.next() => match next {
                    Some(info) => on_slot(SlotUpdate {
                        slot: info.slot,
                        parent: info.parent,
                        root: info.root,
                    }),
                    None => break Err(FetchError::unavailable("slot_subscription", "stream closed")),
                },
            }
        };

        unsubscribe().await;
        drop(stream);
        if let Err(e) = client.shutdown().await {
            logger::debug(LogTag::Subscription, &format!("Pubsub shutdown error: {}", e));
        }

        result
    }
}

struct ActiveSubscription {
    id: u64,
    live: Arc<Mutex<bool>>,
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl ActiveSubscription {
    /// Fence out further callbacks and wake the stream task
    fn cancel(self) {
        *self.live.lock() = false;
        self.shutdown.notify_one();
        drop(self.task);
    }
}

/// Keeps at most one live slot subscription
pub struct SlotListener {
    transport: Arc<dyn SlotTransport>,
    current: Mutex<Option<ActiveSubscription>>,
    next_id: AtomicU64,
}

impl SlotListener {
    pub fn new(transport: Arc<dyn SlotTransport>) -> Self {
        Self {
            transport,
            current: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .map(|sub| *sub.live.lock())
            .unwrap_or(false)
    }

    /// Start forwarding slot changes to `on_event`, replacing any previous subscription
    pub fn subscribe(&self, on_event: SlotCallback) {
        let mut current = self.current.lock();
        if let Some(previous) = current.take() {
            logger::debug(
                LogTag::Subscription,
                &format!("Replacing slot subscription #{}", previous.id),
            );
            previous.cancel();
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let live = Arc::new(Mutex::new(true));
        let shutdown = Arc::new(Notify::new());

        let guarded: SlotCallback = {
            let live = live.clone();
            Arc::new(move |update| {
                let live = live.lock();
                if *live {
                    on_event(update);
                }
            })
        };

        let transport = self.transport.clone();
        let task_live = live.clone();
        let task_shutdown = shutdown.clone();
        let task = tokio::spawn(async move {
            logger::info(
                LogTag::Subscription,
                &format!("Slot subscription #{} started on {}", id, transport.name()),
            );

            match transport.stream_slots(guarded, task_shutdown).await {
                Ok(()) => logger::debug(
                    LogTag::Subscription,
                    &format!("Slot subscription #{} closed", id),
                ),
                Err(e) => {
                    // A dead stream no longer counts as subscribed
                    *task_live.lock() = false;
                    logger::warning(
                        LogTag::Subscription,
                        &format!("Slot subscription #{} ended: {}", id, e),
                    );
                }
            }
        });

        *current = Some(ActiveSubscription {
            id,
            live,
            shutdown,
            task,
        });
    }

    /// Stop delivery. Idempotent; no callback runs after this returns.
    pub fn unsubscribe(&self) {
        if let Some(active) = self.current.lock().take() {
            logger::info(
                LogTag::Subscription,
                &format!("Slot subscription #{} unsubscribed", active.id),
            );
            active.cancel();
        }
    }
}

impl Drop for SlotListener {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::time::sleep;

    /// Emits one slot every 100ms until shut down
    struct TickingTransport {
        streams: AtomicUsize,
    }

    impl TickingTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                streams: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SlotTransport for TickingTransport {
        fn name(&self) -> &str {
            "ticking"
        }

        async fn stream_slots(&self, on_slot: SlotCallback, shutdown: Arc<Notify>) -> Result<(), FetchError> {
            self.streams.fetch_add(1, Ordering::SeqCst);
            let mut slot = 100;
            loop {
                tokio::select! {
                    _ = shutdown.notified() => return Ok(()),
                    _ = sleep(Duration::from_millis(100)) => {
                        slot += 1;
                        on_slot(SlotUpdate { slot, parent: slot - 1, root: slot - 32 });
                    }
                }
            }
        }
    }

    /// Fails right away
    struct BrokenTransport;

    #[async_trait]
    impl SlotTransport for BrokenTransport {
        fn name(&self) -> &str {
            "broken"
        }

        async fn stream_slots(&self, _on_slot: SlotCallback, _shutdown: Arc<Notify>) -> Result<(), FetchError> {
            Err(FetchError::unavailable("slot_subscription", "handshake failed"))
        }
    }

    fn recorder() -> (SlotCallback, Arc<Mutex<Vec<u64>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let callback: SlotCallback = {
            let seen = seen.clone();
            Arc::new(move |update: SlotUpdate| seen.lock().push(update.slot))
        };
        (callback, seen)
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_arrive_in_order() {
        let listener = SlotListener::new(TickingTransport::new());
        let (callback, seen) = recorder();

        listener.subscribe(callback);
        sleep(Duration::from_millis(350)).await;

        assert_eq!(*seen.lock(), vec![101, 102, 103]);
        assert!(listener.is_subscribed());
        listener.unsubscribe();
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubscribe_keeps_single_subscription() {
        let transport = TickingTransport::new();
        let listener = SlotListener::new(transport.clone());
        let (first, first_seen) = recorder();
        let (second, second_seen) = recorder();

        listener.subscribe(first);
        listener.subscribe(second);
        sleep(Duration::from_millis(350)).await;

        // The first stream was cancelled before it delivered anything
        assert!(first_seen.lock().is_empty());
        assert_eq!(*second_seen.lock(), vec![101, 102, 103]);
        listener.unsubscribe();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_callbacks_after_unsubscribe() {
        let listener = SlotListener::new(TickingTransport::new());
        let (callback, seen) = recorder();

        listener.subscribe(callback);
        sleep(Duration::from_millis(250)).await;
        listener.unsubscribe();
        listener.unsubscribe();
        let delivered = seen.lock().len();

        sleep(Duration::from_secs(2)).await;
        assert_eq!(seen.lock().len(), delivered);
        assert!(!listener.is_subscribed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_broken_transport_is_not_reported_as_live() {
        let listener = SlotListener::new(Arc::new(BrokenTransport));
        let (callback, seen) = recorder();

        listener.subscribe(callback);
        sleep(Duration::from_millis(10)).await;

        assert!(!listener.is_subscribed());
        assert!(seen.lock().is_empty());
    }
}

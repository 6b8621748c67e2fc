//! Aggregator: owns the pollers, the slot subscription and the view model
//!
//! The presentation layer only talks to this object. `start()` launches one
//! poller per enabled source, the slot listener and, when a wallet is
//! configured, a wallet refresh loop. `stop()` fences all of them out of the
//! store and waits for their tasks.

pub mod store;
pub mod types;

use crate::config::{Config, PollingConfig, WalletConfig};
use crate::logger::{self, LogTag};
use crate::poller::{PollSink, Poller, PollerHandle};
use crate::query::QueryHandler;
use crate::sources::{self, DataSource, LookupSource, SolanaRpc};
use crate::subscription::{PubsubTransport, SlotCallback, SlotListener, SlotTransport};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use store::ViewModelStore;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use types::{AggregateViewModel, QuerySlot};

const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Default)]
struct RunState {
    started: bool,
    pollers: Vec<PollerHandle>,
    wallet_watch: Option<WalletWatch>,
}

/// Periodic refresh of the configured wallet through the query handler
struct WalletWatch {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl WalletWatch {
    fn start(queries: QueryHandler, address: String, interval: Duration) -> Self {
        let shutdown = Arc::new(Notify::new());
        let task_shutdown = shutdown.clone();

        logger::info(
            LogTag::Query,
            &format!("Watching wallet {} (interval={}s)", address, interval.as_secs()),
        );

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = task_shutdown.notified() => break,
                    result = queries.execute(QuerySlot::Wallet, &address) => {
                        if let Err(e) = result {
                            logger::debug(LogTag::Query, &format!("Wallet refresh failed: {}", e.reason()));
                        }
                    }
                }

                tokio::select! {
                    _ = task_shutdown.notified() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        });

        Self { shutdown, task }
    }

    /// Returns false when the task outlived `wait` and was aborted
    async fn stop(self, wait: Duration) -> bool {
        self.shutdown.notify_one();
        let mut task = self.task;
        match tokio::time::timeout(wait, &mut task).await {
            Ok(_) => true,
            Err(_) => {
                logger::warning(LogTag::Query, "Wallet watch did not exit in time, aborting");
                task.abort();
                let _ = task.await;
                false
            }
        }
    }
}

pub struct Aggregator {
    sources: Vec<Arc<dyn DataSource>>,
    polling: PollingConfig,
    wallet: WalletConfig,
    listener: Option<SlotListener>,
    store: ViewModelStore,
    queries: QueryHandler,
    state: Mutex<RunState>,
}

impl Aggregator {
    pub fn new(
        sources: Vec<Arc<dyn DataSource>>,
        lookups: Vec<Arc<dyn LookupSource>>,
        transport: Option<Arc<dyn SlotTransport>>,
        polling: PollingConfig,
        wallet: WalletConfig,
    ) -> Self {
        let store = ViewModelStore::new();
        let queries = QueryHandler::new(lookups, store.clone());

        Self {
            sources,
            polling,
            wallet,
            listener: transport.map(SlotListener::new),
            store,
            queries,
            state: Mutex::new(RunState::default()),
        }
    }

    /// Real Solana RPC, websocket and price index stack
    pub fn from_config(config: &Config) -> Result<Self, String> {
        let rpc = SolanaRpc::from_config(&config.rpc)?;
        let sources = sources::default_sources(&rpc, config)?;
        let lookups = sources::default_lookups(&rpc, config);

        let transport: Option<Arc<dyn SlotTransport>> = if config.polling.slot_subscription {
            Some(Arc::new(PubsubTransport::new(rpc.endpoints().ws_url.clone())))
        } else {
            None
        };

        Ok(Self::new(
            sources,
            lookups,
            transport,
            config.polling.clone(),
            config.wallet.clone(),
        ))
    }

    /// Launch background work. Calling it again is a no-op.
    pub fn start(&self) {
        let mut state = self.state.lock();
        if state.started {
            logger::debug(LogTag::Aggregator, "Aggregator already started");
            return;
        }
        state.started = true;

        let sink: PollSink = {
            let store = self.store.clone();
            Arc::new(move |key, result| {
                store.publish(key, result);
            })
        };

        for source in &self.sources {
            let key = source.key();
            if !self.polling.is_enabled(key) {
                logger::debug(LogTag::Aggregator, &format!("{} polling disabled", key));
                continue;
            }
            state.pollers.push(Poller::start(
                source.clone(),
                self.polling.interval_for(key),
                self.polling.fetch_timeout(),
                sink.clone(),
            ));
        }

        if let Some(listener) = &self.listener {
            let store = self.store.clone();
            let on_slot: SlotCallback = Arc::new(move |update| store.set_subscription_payload(update));
            listener.subscribe(on_slot);
        }

        if let Some(address) = self.watched_wallet() {
            let interval = Duration::from_secs(self.wallet.refresh_interval_secs.max(1));
            state.wallet_watch = Some(WalletWatch::start(self.queries.clone(), address, interval));
        }

        logger::info(
            LogTag::Aggregator,
            &format!(
                "Aggregator started ({} pollers, slot subscription={}, wallet watch={})",
                state.pollers.len(),
                self.listener.is_some(),
                state.wallet_watch.is_some()
            ),
        );
    }

    /// Stop all background work and wait for it. Idempotent.
    pub async fn stop(&self) {
        let (pollers, wallet_watch) = {
            let mut state = self.state.lock();
            (std::mem::take(&mut state.pollers), state.wallet_watch.take())
        };

        if pollers.is_empty() && wallet_watch.is_none() && !self.is_subscribed() {
            return;
        }

        // Fence everything first, then wait
        for poller in &pollers {
            poller.stop();
        }
        if let Some(listener) = &self.listener {
            listener.unsubscribe();
        }

        for poller in &pollers {
            poller.join(JOIN_TIMEOUT).await;
        }
        if let Some(watch) = wallet_watch {
            watch.stop(JOIN_TIMEOUT).await;
        }

        logger::info(LogTag::Aggregator, "Aggregator stopped");
    }

    fn is_subscribed(&self) -> bool {
        self.listener
            .as_ref()
            .map(SlotListener::is_subscribed)
            .unwrap_or(false)
    }

    fn watched_wallet(&self) -> Option<String> {
        self.wallet
            .address
            .as_ref()
            .map(|address| address.trim().to_string())
            .filter(|address| !address.is_empty())
    }

    pub fn store(&self) -> &ViewModelStore {
        &self.store
    }

    pub fn snapshot(&self) -> AggregateViewModel {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<AggregateViewModel> {
        self.store.subscribe()
    }

    pub fn query_handler(&self) -> &QueryHandler {
        &self.queries
    }
}

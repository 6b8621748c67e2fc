/// Periodic metric poller
///
/// One task per data source: an immediate fetch, then one fetch every
/// `interval` measured from the end of the previous one. Fetches never
/// overlap, so a slow upstream stretches the cycle instead of queueing calls.
///
/// Publishing and `stop()` take the same guard. Once `stop()` has returned
/// the sink is never called again, even for a fetch that was already in
/// flight.
use crate::aggregator::types::{MetricKey, MetricValue};
use crate::errors::FetchError;
use crate::logger::{self, LogTag};
use crate::sources::DataSource;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

/// Receives every poll outcome while the poller is active
pub type PollSink = Arc<dyn Fn(MetricKey, Result<MetricValue, FetchError>) + Send + Sync>;

pub struct Poller;

impl Poller {
    /// Spawn the poll loop on the current runtime
    pub fn start(
        source: Arc<dyn DataSource>,
        interval: Duration,
        fetch_timeout: Duration,
        sink: PollSink,
    ) -> PollerHandle {
        let key = source.key();
        let active = Arc::new(Mutex::new(true));
        let shutdown = Arc::new(Notify::new());

        logger::info(
            LogTag::Poller,
            &format!(
                "Starting {} poller ({}, interval={}ms, timeout={}ms)",
                key,
                source.description(),
                interval.as_millis(),
                fetch_timeout.as_millis()
            ),
        );

        let task = tokio::spawn(run_poll_loop(
            source,
            interval,
            fetch_timeout,
            sink,
            active.clone(),
            shutdown.clone(),
        ));

        PollerHandle {
            key,
            active,
            shutdown,
            task: Mutex::new(Some(task)),
        }
    }
}

async fn run_poll_loop(
    source: Arc<dyn DataSource>,
    interval: Duration,
    fetch_timeout: Duration,
    sink: PollSink,
    active: Arc<Mutex<bool>>,
    shutdown: Arc<Notify>,
) {
    let key = source.key();
    let timeout_ms = fetch_timeout.as_millis() as u64;

    loop {
        let outcome = tokio::select! {
            _ = shutdown.notified() => break,
            result = timeout(fetch_timeout, source.fetch()) => match result {
                Ok(result) => result,
                Err(_) => Err(FetchError::timeout(key.as_str(), timeout_ms)),
            },
        };

        if let Err(e) = &outcome {
            if !e.is_retryable() {
                logger::warning(
                    LogTag::Poller,
                    &format!("{} returned a non-retryable error: {}", key, e),
                );
            }
        }

        {
            let active = active.lock();
            if !*active {
                break;
            }
            sink(key, outcome);
        }

        tokio::select! {
            _ = shutdown.notified() => break,
            _ = sleep(interval) => {}
        }
    }

    logger::debug(LogTag::Poller, &format!("{} poller exited", key));
}

/// Control handle for one running poller
pub struct PollerHandle {
    key: MetricKey,
    active: Arc<Mutex<bool>>,
    shutdown: Arc<Notify>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PollerHandle {
    pub fn key(&self) -> MetricKey {
        self.key
    }

    pub fn is_active(&self) -> bool {
        *self.active.lock()
    }

    /// Stop polling. Idempotent; no result is published after this returns.
    pub fn stop(&self) {
        {
            let mut active = self.active.lock();
            if !*active {
                return;
            }
            *active = false;
        }

        // notify_one stores a permit if the task is not parked on notified() yet
        self.shutdown.notify_one();
        logger::info(LogTag::Poller, &format!("Stopped {} poller", self.key));
    }

    /// Wait for the task to exit, aborting it if it outlives `wait`.
    /// Returns false when the task had to be aborted.
    pub async fn join(&self, wait: Duration) -> bool {
        let task = self.task.lock().take();
        let Some(mut task) = task else {
            return true;
        };

        match timeout(wait, &mut task).await {
            Ok(_) => true,
            Err(_) => {
                logger::warning(
                    LogTag::Poller,
                    &format!("{} poller did not exit within {}ms, aborting", self.key, wait.as_millis()),
                );
                task.abort();
                false
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::store::ViewModelStore;
    use crate::aggregator::types::MetricStatus;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Plays back scripted (delay, result) steps, repeating the last one
    struct ScriptedSource {
        calls: Arc<AtomicUsize>,
        script: Mutex<VecDeque<(Duration, Result<MetricValue, FetchError>)>>,
    }

    impl ScriptedSource {
        fn new(steps: Vec<(Duration, Result<MetricValue, FetchError>)>) -> (Arc<Self>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let source = Arc::new(Self {
                calls: calls.clone(),
                script: Mutex::new(steps.into()),
            });
            (source, calls)
        }
    }

    #[async_trait]
    impl DataSource for ScriptedSource {
        fn key(&self) -> MetricKey {
            MetricKey::TransactionMetrics
        }

        async fn fetch(&self) -> Result<MetricValue, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay, result) = {
                let mut script = self.script.lock();
                if script.len() > 1 {
                    script.pop_front()
                } else {
                    script.front().cloned()
                }
            }
            .unwrap_or((Duration::ZERO, Err(FetchError::unavailable("script", "empty"))));

            if !delay.is_zero() {
                sleep(delay).await;
            }
            result
        }
    }

    fn tps(value: f64) -> MetricValue {
        MetricValue::TransactionMetrics {
            txn_count: 0,
            txn_per_sec: value,
        }
    }

    fn down() -> Result<MetricValue, FetchError> {
        Err(FetchError::unavailable("rpc", "connection refused"))
    }

    fn store_sink(store: &ViewModelStore) -> PollSink {
        let store = store.clone();
        Arc::new(move |key, result| {
            store.publish(key, result);
        })
    }

    const SECOND: Duration = Duration::from_millis(1000);
    const LONG_TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn test_first_success_is_fresh() {
        let store = ViewModelStore::new();
        let (source, calls) = ScriptedSource::new(vec![(Duration::ZERO, Ok(tps(1200.0)))]);

        let handle = Poller::start(source, SECOND, LONG_TIMEOUT, store_sink(&store));
        sleep(Duration::from_millis(10)).await;

        let vm = store.snapshot();
        let snapshot = vm.metric(MetricKey::TransactionMetrics);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(snapshot.status, MetricStatus::Fresh);
        assert_eq!(snapshot.value, Some(tps(1200.0)));
        assert!(snapshot.last_success.is_some());
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_value_then_failures_goes_stale_and_keeps_value() {
        let store = ViewModelStore::new();
        let (source, calls) = ScriptedSource::new(vec![
            (Duration::ZERO, Ok(tps(2500.0))),
            (Duration::ZERO, down()),
        ]);

        let handle = Poller::start(source, SECOND, LONG_TIMEOUT, store_sink(&store));
        sleep(Duration::from_millis(2500)).await;

        // t=0 success, t=1000 and t=2000 failures
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let vm = store.snapshot();
        let snapshot = vm.metric(MetricKey::TransactionMetrics);
        assert_eq!(snapshot.status, MetricStatus::Stale);
        assert_eq!(snapshot.value, Some(tps(2500.0)));
        assert_eq!(snapshot.consecutive_failures, 2);
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_keeps_polling() {
        let store = ViewModelStore::new();
        let (source, calls) = ScriptedSource::new(vec![(
            Duration::ZERO,
            Err(FetchError::not_found("no performance samples")),
        )]);

        let handle = Poller::start(source, SECOND, LONG_TIMEOUT, store_sink(&store));
        sleep(Duration::from_millis(1500)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(handle.is_active());
        let vm = store.snapshot();
        assert_eq!(vm.metric(MetricKey::TransactionMetrics).status, MetricStatus::Failed);
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_delays_next_tick() {
        let store = ViewModelStore::new();
        let (source, calls) = ScriptedSource::new(vec![
            (Duration::ZERO, Ok(tps(2500.0))),
            (Duration::from_millis(1500), down()),
        ]);

        let handle = Poller::start(source, SECOND, LONG_TIMEOUT, store_sink(&store));
        sleep(Duration::from_millis(2500)).await;

        // Second call runs 1000..2500, the third cannot start before 3500
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        sleep(Duration::from_millis(1100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_successful_is_failed() {
        let store = ViewModelStore::new();
        let (source, _calls) = ScriptedSource::new(vec![(Duration::ZERO, down())]);

        let handle = Poller::start(source, SECOND, LONG_TIMEOUT, store_sink(&store));
        sleep(Duration::from_millis(1500)).await;

        let vm = store.snapshot();
        let snapshot = vm.metric(MetricKey::TransactionMetrics);
        assert_eq!(snapshot.status, MetricStatus::Failed);
        assert!(snapshot.value.is_none());
        assert!(snapshot.last_error.as_deref().unwrap_or("").contains("connection refused"));
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let store = ViewModelStore::new();
        let (source, _calls) =
            ScriptedSource::new(vec![(Duration::from_secs(30), Ok(tps(1.0)))]);

        let handle = Poller::start(
            source,
            SECOND,
            Duration::from_millis(200),
            store_sink(&store),
        );
        sleep(Duration::from_millis(300)).await;

        let vm = store.snapshot();
        let snapshot = vm.metric(MetricKey::TransactionMetrics);
        assert_eq!(snapshot.status, MetricStatus::Failed);
        assert!(snapshot.last_error.as_deref().unwrap_or("").contains("timed out"));
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_freezes_invocations() {
        let store = ViewModelStore::new();
        let (source, calls) = ScriptedSource::new(vec![(Duration::ZERO, Ok(tps(10.0)))]);

        let handle = Poller::start(source, SECOND, LONG_TIMEOUT, store_sink(&store));
        sleep(Duration::from_millis(2500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        handle.stop();
        handle.stop();
        assert!(!handle.is_active());
        sleep(Duration::from_secs(10)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(handle.join(SECOND).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_result_is_discarded_after_stop() {
        let published = Arc::new(AtomicUsize::new(0));
        let sink: PollSink = {
            let published = published.clone();
            Arc::new(move |_, _| {
                published.fetch_add(1, Ordering::SeqCst);
            })
        };
        let (source, calls) = ScriptedSource::new(vec![(Duration::from_millis(500), Ok(tps(1.0)))]);

        let handle = Poller::start(source, SECOND, LONG_TIMEOUT, sink);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        handle.stop();
        sleep(Duration::from_secs(2)).await;

        assert_eq!(published.load(Ordering::SeqCst), 0);
        assert!(handle.join(SECOND).await);
    }
}

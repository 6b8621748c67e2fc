use super::types::{
    AggregateViewModel, MetricKey, MetricSnapshot, MetricStatus, MetricValue, QueryOutcome,
    QuerySlot, SlotUpdate,
};
use crate::errors::FetchError;
use crate::logger::{self, LogTag};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;

/// Single authoritative store for the view model
///
/// Backed by a watch channel: every write is one atomic mutation under the
/// channel's lock and wakes every subscriber; `snapshot()` always returns a
/// consistent copy. Cloning the store shares the same view model.
#[derive(Clone)]
pub struct ViewModelStore {
    inner: Arc<watch::Sender<AggregateViewModel>>,
}

impl Default for ViewModelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewModelStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AggregateViewModel::new());
        Self {
            inner: Arc::new(tx),
        }
    }

    /// Replace one metric snapshot wholesale
    pub fn update(&self, key: MetricKey, snapshot: MetricSnapshot) {
        self.inner.send_modify(|vm| {
            vm.metrics.insert(key, snapshot);
            vm.revision += 1;
        });
    }

    /// Publish a successful poll as a Fresh snapshot
    pub fn record_success(&self, key: MetricKey, value: MetricValue) -> MetricStatus {
        let mut previous = MetricStatus::Pending;
        self.inner.send_modify(|vm| {
            previous = vm.metric(key).status;
            vm.metrics
                .insert(key, MetricSnapshot::fresh(value, Utc::now()));
            vm.revision += 1;
        });

        log_transition(key, previous, MetricStatus::Fresh, None);
        MetricStatus::Fresh
    }

    /// Degrade the current snapshot after a failed poll, keeping its value
    pub fn record_failure(&self, key: MetricKey, error: &FetchError) -> MetricStatus {
        let mut previous = MetricStatus::Pending;
        let mut next = MetricStatus::Failed;
        let message = error.to_string();
        self.inner.send_modify(|vm| {
            let current = vm.metric(key);
            previous = current.status;
            let degraded = current.after_failure(message.clone());
            next = degraded.status;
            vm.metrics.insert(key, degraded);
            vm.revision += 1;
        });

        log_transition(key, previous, next, Some(&message));
        next
    }

    /// Record one poll outcome
    pub fn publish(&self, key: MetricKey, result: Result<MetricValue, FetchError>) -> MetricStatus {
        match result {
            Ok(value) => self.record_success(key, value),
            Err(error) => self.record_failure(key, &error),
        }
    }

    /// Latest slot-change payload
    pub fn set_subscription_payload(&self, update: SlotUpdate) {
        self.inner.send_modify(|vm| {
            vm.slot = Some(update);
            vm.revision += 1;
        });
    }

    /// Overwrite the result shown in a query slot
    pub fn set_query_result(&self, slot: QuerySlot, outcome: QueryOutcome) {
        self.inner.send_modify(|vm| {
            *vm.query_mut(slot) = Some(outcome);
            vm.revision += 1;
        });
    }

    /// Read-only copy of the current view model
    pub fn snapshot(&self) -> AggregateViewModel {
        self.inner.borrow().clone()
    }

    /// Change notifications for the presentation layer
    pub fn subscribe(&self) -> watch::Receiver<AggregateViewModel> {
        self.inner.subscribe()
    }
}

/// Log only on status transitions, at a level matching the new status
fn log_transition(
    key: MetricKey,
    previous: MetricStatus,
    next: MetricStatus,
    error: Option<&str>,
) {
    if previous == next {
        logger::debug(
            LogTag::Aggregator,
            &format!("{} updated (status={})", key, next.as_str()),
        );
        return;
    }

    match next {
        MetricStatus::Fresh if previous == MetricStatus::Pending => logger::debug(
            LogTag::Aggregator,
            &format!("{} first value received", key),
        ),
        MetricStatus::Fresh => logger::info(
            LogTag::Aggregator,
            &format!("{} recovered from {} to fresh", key, previous.as_str()),
        ),
        MetricStatus::Stale | MetricStatus::Failed => logger::warning(
            LogTag::Aggregator,
            &format!(
                "{} is now {}: {}",
                key,
                next.as_str(),
                error.unwrap_or("unknown error")
            ),
        ),
        MetricStatus::Pending => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::types::{QueryValue, WalletInfo};

    fn tps(value: f64) -> MetricValue {
        MetricValue::TransactionMetrics {
            txn_count: 1,
            txn_per_sec: value,
        }
    }

    #[test]
    fn test_success_then_failure_keeps_value() {
        let store = ViewModelStore::new();
        assert_eq!(
            store.record_success(MetricKey::TransactionMetrics, tps(2500.0)),
            MetricStatus::Fresh
        );
        assert_eq!(
            store.record_failure(
                MetricKey::TransactionMetrics,
                &FetchError::unavailable("rpc", "boom")
            ),
            MetricStatus::Stale
        );

        let vm = store.snapshot();
        let snapshot = vm.metric(MetricKey::TransactionMetrics);
        assert_eq!(snapshot.status, MetricStatus::Stale);
        assert_eq!(snapshot.value, Some(tps(2500.0)));
    }

    #[test]
    fn test_failure_only_affects_its_own_key() {
        let store = ViewModelStore::new();
        store.record_success(MetricKey::SolPrice, MetricValue::SolPrice { usd: 10.0 });
        store.record_failure(MetricKey::GasFees, &FetchError::unavailable("rpc", "down"));

        let vm = store.snapshot();
        assert_eq!(vm.metric(MetricKey::SolPrice).status, MetricStatus::Fresh);
        assert_eq!(vm.metric(MetricKey::GasFees).status, MetricStatus::Failed);
        assert_eq!(vm.metric(MetricKey::EpochInfo).status, MetricStatus::Pending);
    }

    #[test]
    fn test_snapshot_is_a_detached_copy() {
        let store = ViewModelStore::new();
        let before = store.snapshot();
        store.set_subscription_payload(SlotUpdate {
            slot: 10,
            parent: 9,
            root: 1,
        });
        assert!(before.slot.is_none());
        assert_eq!(store.snapshot().slot.map(|s| s.slot), Some(10));
        assert_eq!(store.snapshot().revision, before.revision + 1);
    }

    #[test]
    fn test_query_result_overwrites_and_clears() {
        let store = ViewModelStore::new();
        let found = QueryOutcome::Found {
            value: QueryValue::Wallet(WalletInfo {
                address: "ABC".to_string(),
                sol_balance: 1.5,
                tokens: vec![],
            }),
        };
        store.set_query_result(QuerySlot::Wallet, found.clone());
        assert_eq!(store.snapshot().wallet, Some(found));

        let not_found = QueryOutcome::NotFound {
            input: "XYZ".to_string(),
        };
        store.set_query_result(QuerySlot::Wallet, not_found.clone());
        assert_eq!(store.snapshot().wallet, Some(not_found));
        assert!(store.snapshot().transaction.is_none());
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let store = ViewModelStore::new();
        let mut rx = store.subscribe();
        store.record_success(MetricKey::FinalityTime, MetricValue::FinalityTime { seconds: 13 });
        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow().metric(MetricKey::FinalityTime).status,
            MetricStatus::Fresh
        );
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// METRICS
// ============================================================================

/// Every polled metric the view model tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    SolPrice,
    NetworkStats,
    TransactionMetrics,
    EpochInfo,
    GasFees,
    ClusterHealth,
    FinalityTime,
    LatestBlock,
    Validators,
}

impl MetricKey {
    pub const ALL: [MetricKey; 9] = [
        MetricKey::SolPrice,
        MetricKey::NetworkStats,
        MetricKey::TransactionMetrics,
        MetricKey::EpochInfo,
        MetricKey::GasFees,
        MetricKey::ClusterHealth,
        MetricKey::FinalityTime,
        MetricKey::LatestBlock,
        MetricKey::Validators,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::SolPrice => "sol_price",
            MetricKey::NetworkStats => "network_stats",
            MetricKey::TransactionMetrics => "transaction_metrics",
            MetricKey::EpochInfo => "epoch_info",
            MetricKey::GasFees => "gas_fees",
            MetricKey::ClusterHealth => "cluster_health",
            MetricKey::FinalityTime => "finality_time",
            MetricKey::LatestBlock => "latest_block",
            MetricKey::Validators => "validators",
        }
    }
}

impl std::fmt::Display for MetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed payload of one metric. Fees are in lamports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricValue {
    SolPrice {
        usd: f64,
    },
    NetworkStats {
        block_height: u64,
        active_nodes: usize,
    },
    TransactionMetrics {
        txn_count: u64,
        txn_per_sec: f64,
    },
    EpochInfo {
        epoch: u64,
        slot_index: u64,
        slots_in_epoch: u64,
        progress_pct: f64,
    },
    GasFees {
        average_fee: f64,
        total_fee: u64,
        transaction_count: usize,
    },
    ClusterHealth {
        ping_ms: u64,
        total_nodes: usize,
        active_nodes: usize,
    },
    FinalityTime {
        seconds: u64,
    },
    LatestBlock {
        block_height: Option<u64>,
        slot: u64,
        blockhash: String,
        transaction_count: usize,
        block_time: Option<i64>,
    },
    Validators {
        current: usize,
        delinquent: usize,
        average_commission: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    /// Never polled yet
    Pending,
    /// Last poll succeeded
    Fresh,
    /// Last poll failed, value is from an earlier success
    Stale,
    /// Every poll so far failed
    Failed,
}

impl MetricStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricStatus::Pending => "pending",
            MetricStatus::Fresh => "fresh",
            MetricStatus::Stale => "stale",
            MetricStatus::Failed => "failed",
        }
    }
}

/// Latest known state of one metric, replaced wholesale on every update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub value: Option<MetricValue>,
    pub status: MetricStatus,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}

static PENDING_SNAPSHOT: MetricSnapshot = MetricSnapshot::pending();

impl MetricSnapshot {
    pub const fn pending() -> Self {
        Self {
            value: None,
            status: MetricStatus::Pending,
            last_success: None,
            last_error: None,
            consecutive_failures: 0,
        }
    }

    pub fn fresh(value: MetricValue, at: DateTime<Utc>) -> Self {
        Self {
            value: Some(value),
            status: MetricStatus::Fresh,
            last_success: Some(at),
            last_error: None,
            consecutive_failures: 0,
        }
    }

    /// Snapshot that follows this one after a failed poll.
    /// The last good value survives; only the status degrades.
    pub fn after_failure(&self, error: String) -> Self {
        let status = if self.value.is_some() {
            MetricStatus::Stale
        } else {
            MetricStatus::Failed
        };

        Self {
            value: self.value.clone(),
            status,
            last_success: self.last_success,
            last_error: Some(error),
            consecutive_failures: self.consecutive_failures.saturating_add(1),
        }
    }
}

// ============================================================================
// SLOT SUBSCRIPTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotUpdate {
    pub slot: u64,
    pub parent: u64,
    pub root: u64,
}

// ============================================================================
// ON-DEMAND QUERIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuerySlot {
    Transaction,
    Wallet,
    WalletHistory,
}

impl QuerySlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuerySlot::Transaction => "transaction",
            QuerySlot::Wallet => "wallet",
            QuerySlot::WalletHistory => "wallet_history",
        }
    }

    /// Text shown to the user when a lookup of this kind fails
    pub fn failure_message(&self) -> &'static str {
        match self {
            QuerySlot::Transaction => "Failed to fetch transaction",
            QuerySlot::Wallet => "Failed to fetch wallet data",
            QuerySlot::WalletHistory => "Failed to fetch wallet transactions",
        }
    }
}

impl std::fmt::Display for QuerySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<i64>,
    pub fee_lamports: u64,
    pub succeeded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub mint: String,
    pub balance: f64,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub address: String,
    pub sol_balance: f64,
    pub tokens: Vec<TokenBalance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<i64>,
    pub fee: u64,
    pub status: String,
    pub instructions: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum QueryValue {
    Transaction(TransactionDetails),
    Wallet(WalletInfo),
    WalletHistory(Vec<WalletTransaction>),
}

/// What a query slot shows after a lookup resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QueryOutcome {
    Found { value: QueryValue },
    NotFound { input: String },
    Failed { message: String, reason: String },
}

// ============================================================================
// VIEW MODEL
// ============================================================================

/// Everything the presentation layer can read, always fully populated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateViewModel {
    pub metrics: BTreeMap<MetricKey, MetricSnapshot>,
    pub slot: Option<SlotUpdate>,
    pub transaction: Option<QueryOutcome>,
    pub wallet: Option<QueryOutcome>,
    pub wallet_history: Option<QueryOutcome>,
    /// Bumped on every write
    pub revision: u64,
}

impl Default for AggregateViewModel {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregateViewModel {
    pub fn new() -> Self {
        let metrics = MetricKey::ALL
            .iter()
            .map(|key| (*key, MetricSnapshot::pending()))
            .collect();

        Self {
            metrics,
            slot: None,
            transaction: None,
            wallet: None,
            wallet_history: None,
            revision: 0,
        }
    }

    pub fn metric(&self, key: MetricKey) -> &MetricSnapshot {
        self.metrics.get(&key).unwrap_or(&PENDING_SNAPSHOT)
    }

    pub fn query(&self, slot: QuerySlot) -> Option<&QueryOutcome> {
        match slot {
            QuerySlot::Transaction => self.transaction.as_ref(),
            QuerySlot::Wallet => self.wallet.as_ref(),
            QuerySlot::WalletHistory => self.wallet_history.as_ref(),
        }
    }

    pub(crate) fn query_mut(&mut self, slot: QuerySlot) -> &mut Option<QueryOutcome> {
        match slot {
            QuerySlot::Transaction => &mut self.transaction,
            QuerySlot::Wallet => &mut self.wallet,
            QuerySlot::WalletHistory => &mut self.wallet_history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_view_model_has_every_key_pending() {
        let vm = AggregateViewModel::new();
        assert_eq!(vm.metrics.len(), MetricKey::ALL.len());
        for key in MetricKey::ALL {
            assert_eq!(vm.metric(key).status, MetricStatus::Pending);
            assert!(vm.metric(key).value.is_none());
        }
        assert!(vm.slot.is_none());
        assert!(vm.query(QuerySlot::Wallet).is_none());
    }

    #[test]
    fn test_failure_after_success_is_stale_and_keeps_value() {
        let value = MetricValue::SolPrice { usd: 142.5 };
        let fresh = MetricSnapshot::fresh(value.clone(), Utc::now());

        let stale = fresh.after_failure("timeout".to_string());
        assert_eq!(stale.status, MetricStatus::Stale);
        assert_eq!(stale.value, Some(value));
        assert_eq!(stale.last_success, fresh.last_success);
        assert_eq!(stale.consecutive_failures, 1);

        let still_stale = stale.after_failure("timeout".to_string());
        assert_eq!(still_stale.status, MetricStatus::Stale);
        assert_eq!(still_stale.consecutive_failures, 2);
    }

    #[test]
    fn test_failure_without_success_is_failed() {
        let failed = MetricSnapshot::pending().after_failure("refused".to_string());
        assert_eq!(failed.status, MetricStatus::Failed);
        assert!(failed.value.is_none());
        assert_eq!(failed.last_error.as_deref(), Some("refused"));
    }

    #[test]
    fn test_metric_keys_serialize_as_names() {
        let json = serde_json::to_value(AggregateViewModel::new()).unwrap();
        assert!(json["metrics"]["sol_price"].is_object());
        assert_eq!(json["metrics"]["gas_fees"]["status"], "pending");
    }
}

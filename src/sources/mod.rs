//! Data source adapters
//!
//! Each adapter wraps one external call behind a uniform async contract and
//! converts every failure into a `FetchError`. Adapters hold no mutable state;
//! the RPC and HTTP handles they share are read-only.
//!
//! Polled metrics implement [`DataSource`]; user-triggered lookups implement
//! [`LookupSource`].

pub mod cluster_health;
pub mod epoch;
pub mod finality;
pub mod gas_fees;
pub mod latest_block;
pub mod network;
pub mod price;
pub mod rpc;
pub mod transaction;
pub mod transactions;
pub mod validators;
pub mod wallet;

use crate::aggregator::types::{MetricKey, MetricValue, QuerySlot, QueryValue};
use crate::config::Config;
use crate::errors::FetchError;
use async_trait::async_trait;
use std::sync::Arc;

pub use cluster_health::ClusterHealthSource;
pub use epoch::EpochInfoSource;
pub use finality::FinalityTimeSource;
pub use gas_fees::GasFeesSource;
pub use latest_block::LatestBlockSource;
pub use network::NetworkStatsSource;
pub use price::PriceSource;
pub use rpc::{Cluster, Endpoints, SolanaRpc};
pub use transaction::TransactionLookup;
pub use transactions::TransactionMetricsSource;
pub use validators::ValidatorsSource;
pub use wallet::{WalletHistoryLookup, WalletLookup};

/// A metric that is refreshed on a timer
#[async_trait]
pub trait DataSource: Send + Sync {
    /// View model key this source feeds
    fn key(&self) -> MetricKey;

    /// Human-readable description of the upstream call
    fn description(&self) -> &'static str {
        self.key().as_str()
    }

    /// Perform one fetch
    ///
    /// Must never panic on upstream errors; transport failures are
    /// `FetchError::SourceUnavailable`.
    async fn fetch(&self) -> Result<MetricValue, FetchError>;
}

/// A lookup run once per user action
#[async_trait]
pub trait LookupSource: Send + Sync {
    /// Query slot this lookup writes into
    fn kind(&self) -> QuerySlot;

    async fn lookup(&self, input: &str) -> Result<QueryValue, FetchError>;
}

/// All polled sources backed by the configured cluster and price index
pub fn default_sources(rpc: &SolanaRpc, config: &Config) -> Result<Vec<Arc<dyn DataSource>>, String> {
    let price = PriceSource::new(&config.price)?;

    let sources: Vec<Arc<dyn DataSource>> = vec![
        Arc::new(price),
        Arc::new(NetworkStatsSource::new(rpc.clone())),
        Arc::new(TransactionMetricsSource::new(rpc.clone())),
        Arc::new(EpochInfoSource::new(rpc.clone())),
        Arc::new(GasFeesSource::new(rpc.clone())),
        Arc::new(ClusterHealthSource::new(rpc.clone())),
        Arc::new(FinalityTimeSource::new(rpc.clone())),
        Arc::new(LatestBlockSource::new(rpc.clone())),
        Arc::new(ValidatorsSource::new(rpc.clone())),
    ];

    Ok(sources)
}

/// All lookups backed by the configured cluster
pub fn default_lookups(rpc: &SolanaRpc, config: &Config) -> Vec<Arc<dyn LookupSource>> {
    vec![
        Arc::new(TransactionLookup::new(rpc.clone())),
        Arc::new(WalletLookup::new(rpc.clone())),
        Arc::new(WalletHistoryLookup::new(rpc.clone(), config.wallet.history_limit)),
    ]
}

/// Configuration schemas - all config structures defined once with defaults
///
/// Each struct is defined using the config_struct! macro which provides:
/// - Single-source definition (no repetition)
/// - Embedded defaults
/// - Serde support
use crate::aggregator::types::MetricKey;
use crate::config_struct;
use crate::constants::COINGECKO_BASE_URL;
use std::time::Duration;

// ============================================================================
// RPC CONFIGURATION
// ============================================================================

config_struct! {
    /// Solana RPC endpoint configuration
    pub struct RpcConfig {
        /// devnet, testnet, mainnet-beta or localnet
        cluster: String = "devnet".to_string(),

        /// Explicit RPC URL (overrides cluster)
        url: Option<String> = None,

        /// Explicit websocket URL (derived from the RPC URL when unset)
        ws_url: Option<String> = None,

        /// processed, confirmed or finalized
        commitment: String = "confirmed".to_string(),

        /// Per-request timeout in seconds
        timeout_secs: u64 = 10,
    }
}

// ============================================================================
// PRICE INDEX CONFIGURATION
// ============================================================================

config_struct! {
    /// SOL price index (CoinGecko simple price) configuration
    pub struct PriceConfig {
        base_url: String = COINGECKO_BASE_URL.to_string(),
        coin_id: String = "solana".to_string(),
        vs_currency: String = "usd".to_string(),
        timeout_secs: u64 = 10,
    }
}

// ============================================================================
// POLLING CONFIGURATION
// ============================================================================

config_struct! {
    /// Poll intervals per metric, in seconds
    pub struct PollingConfig {
        /// Upper bound on a single adapter call
        fetch_timeout_secs: u64 = 15,

        sol_price_interval_secs: u64 = 60,
        network_stats_interval_secs: u64 = 60,
        transaction_metrics_interval_secs: u64 = 60,
        epoch_info_interval_secs: u64 = 60,
        gas_fees_interval_secs: u64 = 60,
        cluster_health_interval_secs: u64 = 60,
        finality_time_interval_secs: u64 = 60,
        latest_block_interval_secs: u64 = 10,
        validators_interval_secs: u64 = 300,

        /// Metric names (e.g. "validators") that should not be polled
        disabled_metrics: Vec<String> = Vec::new(),

        /// Keep a live slot-change subscription
        slot_subscription: bool = true,
    }
}

impl PollingConfig {
    pub fn interval_for(&self, key: MetricKey) -> Duration {
        let secs = match key {
            MetricKey::SolPrice => self.sol_price_interval_secs,
            MetricKey::NetworkStats => self.network_stats_interval_secs,
            MetricKey::TransactionMetrics => self.transaction_metrics_interval_secs,
            MetricKey::EpochInfo => self.epoch_info_interval_secs,
            MetricKey::GasFees => self.gas_fees_interval_secs,
            MetricKey::ClusterHealth => self.cluster_health_interval_secs,
            MetricKey::FinalityTime => self.finality_time_interval_secs,
            MetricKey::LatestBlock => self.latest_block_interval_secs,
            MetricKey::Validators => self.validators_interval_secs,
        };
        // A zero interval would spin the poller
        Duration::from_secs(secs.max(1))
    }

    pub fn is_enabled(&self, key: MetricKey) -> bool {
        !self
            .disabled_metrics
            .iter()
            .any(|name| name.eq_ignore_ascii_case(key.as_str()))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

// ============================================================================
// WALLET CONFIGURATION
// ============================================================================

config_struct! {
    /// Watched wallet configuration
    pub struct WalletConfig {
        /// Base58 address refreshed on the dashboard (none = no wallet panel)
        address: Option<String> = None,

        refresh_interval_secs: u64 = 60,

        /// Signatures fetched for the history lookup
        history_limit: usize = 10,
    }
}

// ============================================================================
// DASHBOARD CONFIGURATION
// ============================================================================

config_struct! {
    pub struct DashboardConfig {
        /// Redraw in place instead of appending frames
        clear_screen: bool = true,

        /// Slot updates arrive every ~400ms; frames are coalesced to this pace
        min_redraw_interval_ms: u64 = 500,
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration structure containing all sub-configurations
    pub struct Config {
        rpc: RpcConfig = RpcConfig::default(),
        price: PriceConfig = PriceConfig::default(),
        polling: PollingConfig = PollingConfig::default(),
        wallet: WalletConfig = WalletConfig::default(),
        dashboard: DashboardConfig = DashboardConfig::default(),
    }
}

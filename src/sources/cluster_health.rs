use super::network::active_node_count;
use super::{DataSource, SolanaRpc};
use crate::aggregator::types::{MetricKey, MetricValue};
use crate::errors::FetchError;
use async_trait::async_trait;
use std::time::Instant;

/// RPC round-trip latency and gossip node counts
pub struct ClusterHealthSource {
    rpc: SolanaRpc,
}

impl ClusterHealthSource {
    pub fn new(rpc: SolanaRpc) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl DataSource for ClusterHealthSource {
    fn key(&self) -> MetricKey {
        MetricKey::ClusterHealth
    }

    fn description(&self) -> &'static str {
        "getVersion latency + getClusterNodes"
    }

    async fn fetch(&self) -> Result<MetricValue, FetchError> {
        let name = self.key().as_str();
        let client = self.rpc.client();

        let start = Instant::now();
        client
            .get_version()
            .await
            .map_err(|e| FetchError::unavailable(name, e))?;
        let ping_ms = start.elapsed().as_millis() as u64;

        let nodes = client
            .get_cluster_nodes()
            .await
            .map_err(|e| FetchError::unavailable(name, e))?;

        Ok(MetricValue::ClusterHealth {
            ping_ms,
            total_nodes: nodes.len(),
            active_nodes: active_node_count(nodes.iter().map(|node| node.rpc.is_some())),
        })
    }
}

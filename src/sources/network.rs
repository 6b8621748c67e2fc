use super::{DataSource, SolanaRpc};
use crate::aggregator::types::{MetricKey, MetricValue};
use crate::errors::FetchError;
use async_trait::async_trait;

/// Block height plus the number of gossip nodes that serve RPC
pub struct NetworkStatsSource {
    rpc: SolanaRpc,
}

impl NetworkStatsSource {
    pub fn new(rpc: SolanaRpc) -> Self {
        Self { rpc }
    }
}

/// Nodes that advertise an RPC address
pub fn active_node_count(rpc_addresses: impl IntoIterator<Item = bool>) -> usize {
    rpc_addresses.into_iter().filter(|has_rpc| *has_rpc).count()
}

#[async_trait]
impl DataSource for NetworkStatsSource {
    fn key(&self) -> MetricKey {
        MetricKey::NetworkStats
    }

    fn description(&self) -> &'static str {
        "getBlockHeight + getClusterNodes"
    }

    async fn fetch(&self) -> Result<MetricValue, FetchError> {
        let name = self.key().as_str();
        let client = self.rpc.client();

        let block_height = client
            .get_block_height()
            .await
            .map_err(|e| FetchError::unavailable(name, e))?;
        let nodes = client
            .get_cluster_nodes()
            .await
            .map_err(|e| FetchError::unavailable(name, e))?;

        Ok(MetricValue::NetworkStats {
            block_height,
            active_nodes: active_node_count(nodes.iter().map(|node| node.rpc.is_some())),
        })
    }
}

use super::{DataSource, SolanaRpc};
use crate::aggregator::types::{MetricKey, MetricValue};
use crate::errors::FetchError;
use async_trait::async_trait;
use solana_client::rpc_config::RpcBlockConfig;
use solana_transaction_status::{TransactionDetails, UiConfirmedBlock};

/// Header of the newest confirmed block
pub struct LatestBlockSource {
    rpc: SolanaRpc,
}

impl LatestBlockSource {
    pub fn new(rpc: SolanaRpc) -> Self {
        Self { rpc }
    }
}

pub fn block_summary(slot: u64, block: &UiConfirmedBlock) -> MetricValue {
    MetricValue::LatestBlock {
        block_height: block.block_height,
        slot,
        blockhash: block.blockhash.clone(),
        transaction_count: block.signatures.as_ref().map(Vec::len).unwrap_or(0),
        block_time: block.block_time,
    }
}

#[async_trait]
impl DataSource for LatestBlockSource {
    fn key(&self) -> MetricKey {
        MetricKey::LatestBlock
    }

    fn description(&self) -> &'static str {
        "getSlot + getBlock(signatures)"
    }

    async fn fetch(&self) -> Result<MetricValue, FetchError> {
        let name = self.key().as_str();
        let client = self.rpc.client();
        let commitment = self.rpc.read_commitment();

        let slot = client
            .get_slot_with_commitment(commitment)
            .await
            .map_err(|e| FetchError::unavailable(name, e))?;

        let config = RpcBlockConfig {
            encoding: None,
            transaction_details: Some(TransactionDetails::Signatures),
            rewards: Some(false),
            commitment: Some(commitment),
            max_supported_transaction_version: Some(0),
        };
        let block = client
            .get_block_with_config(slot, config)
            .await
            .map_err(|e| FetchError::unavailable(name, e))?;

        Ok(block_summary(slot, &block))
    }
}

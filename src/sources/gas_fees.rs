use super::{DataSource, SolanaRpc};
use crate::aggregator::types::{MetricKey, MetricValue};
use crate::errors::FetchError;
use async_trait::async_trait;
use solana_client::rpc_config::RpcBlockConfig;
use solana_transaction_status::{TransactionDetails, UiTransactionEncoding};

/// Fees paid in the most recent block
pub struct GasFeesSource {
    rpc: SolanaRpc,
}

impl GasFeesSource {
    pub fn new(rpc: SolanaRpc) -> Self {
        Self { rpc }
    }
}

/// (average, total, count) over per-transaction fees in lamports.
/// A transaction without status meta counts as fee 0.
pub fn summarize_fees(fees: &[u64]) -> (f64, u64, usize) {
    if fees.is_empty() {
        return (0.0, 0, 0);
    }
    let total = fees.iter().fold(0u64, |acc, fee| acc.saturating_add(*fee));
    ((total as f64) / (fees.len() as f64), total, fees.len())
}

#[async_trait]
impl DataSource for GasFeesSource {
    fn key(&self) -> MetricKey {
        MetricKey::GasFees
    }

    fn description(&self) -> &'static str {
        "getSlot + getBlock"
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
            encoding: Some(UiTransactionEncoding::Base64),
            transaction_details: Some(TransactionDetails::Full),
            rewards: Some(false),
            commitment: Some(commitment),
            max_supported_transaction_version: Some(0),
        };
        let block = client
            .get_block_with_config(slot, config)
            .await
            .map_err(|e| FetchError::unavailable(name, e))?;

        let fees: Vec<u64> = block
            .transactions
            .unwrap_or_default()
            .iter()
            .map(|tx| tx.meta.as_ref().map(|meta| meta.fee).unwrap_or(0))
            .collect();
        let (average_fee, total_fee, transaction_count) = summarize_fees(&fees);

        Ok(MetricValue::GasFees {
            average_fee,
            total_fee,
            transaction_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_summary() {
        let (average, total, count) = summarize_fees(&[5000, 5000, 10000, 0]);
        assert_eq!(total, 20000);
        assert_eq!(count, 4);
        assert_eq!(average, 5000.0);
    }

    #[test]
    fn test_empty_block_has_zero_fees() {
        assert_eq!(summarize_fees(&[]), (0.0, 0, 0));
    }
}

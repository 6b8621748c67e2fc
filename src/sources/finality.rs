use super::{DataSource, SolanaRpc};
use crate::aggregator::types::{MetricKey, MetricValue};
use crate::errors::FetchError;
use async_trait::async_trait;
use chrono::Utc;
use solana_sdk::commitment_config::CommitmentConfig;

/// Age of the most recently finalized block
pub struct FinalityTimeSource {
    rpc: SolanaRpc,
}

impl FinalityTimeSource {
    pub fn new(rpc: SolanaRpc) -> Self {
        Self { rpc }
    }
}

/// Seconds between a block's timestamp and now, never negative
pub fn finality_seconds(now: i64, block_time: i64) -> u64 {
    now.saturating_sub(block_time).max(0) as u64
}

#[async_trait]
impl DataSource for FinalityTimeSource {
    fn key(&self) -> MetricKey {
        MetricKey::FinalityTime
    }

    fn description(&self) -> &'static str {
        "getSlot(finalized) + getBlockTime"
    }

    async fn fetch(&self) -> Result<MetricValue, FetchError> {
        let name = self.key().as_str();
        let client = self.rpc.client();

        let slot = client
            .get_slot_with_commitment(CommitmentConfig::finalized())
            .await
            .map_err(|e| FetchError::unavailable(name, e))?;
        let block_time = client
            .get_block_time(slot)
            .await
            .map_err(|e| FetchError::unavailable(name, e))?;

        Ok(MetricValue::FinalityTime {
            seconds: finality_seconds(Utc::now().timestamp(), block_time),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finality_age() {
        assert_eq!(finality_seconds(1_700_000_013, 1_700_000_000), 13);
    }

    #[test]
    fn test_clock_skew_saturates_at_zero() {
        assert_eq!(finality_seconds(1_700_000_000, 1_700_000_005), 0);
    }
}

use super::{DataSource, SolanaRpc};
use crate::aggregator::types::{MetricKey, MetricValue};
use crate::errors::FetchError;
use async_trait::async_trait;

pub struct EpochInfoSource {
    rpc: SolanaRpc,
}

impl EpochInfoSource {
    pub fn new(rpc: SolanaRpc) -> Self {
        Self { rpc }
    }
}

/// Share of the epoch already elapsed, in percent
pub fn epoch_progress_pct(slot_index: u64, slots_in_epoch: u64) -> f64 {
    if slots_in_epoch == 0 {
        return 0.0;
    }
    ((slot_index as f64) / (slots_in_epoch as f64)) * 100.0
}

#[async_trait]
impl DataSource for EpochInfoSource {
    fn key(&self) -> MetricKey {
        MetricKey::EpochInfo
    }

    fn description(&self) -> &'static str {
        "getEpochInfo"
    }

    async fn fetch(&self) -> Result<MetricValue, FetchError> {
        let info = self
            .rpc
            .client()
            .get_epoch_info()
            .await
            .map_err(|e| FetchError::unavailable(self.key().as_str(), e))?;

        Ok(MetricValue::EpochInfo {
            epoch: info.epoch,
            slot_index: info.slot_index,
            slots_in_epoch: info.slots_in_epoch,
            progress_pct: epoch_progress_pct(info.slot_index, info.slots_in_epoch),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_progress() {
        assert_eq!(epoch_progress_pct(216_000, 432_000), 50.0);
        assert_eq!(epoch_progress_pct(0, 432_000), 0.0);
        assert_eq!(epoch_progress_pct(10, 0), 0.0);
    }
}

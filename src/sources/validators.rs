use super::{DataSource, SolanaRpc};
use crate::aggregator::types::{MetricKey, MetricValue};
use crate::errors::FetchError;
use async_trait::async_trait;

/// Vote account counts and the mean commission of current validators
pub struct ValidatorsSource {
    rpc: SolanaRpc,
}

impl ValidatorsSource {
    pub fn new(rpc: SolanaRpc) -> Self {
        Self { rpc }
    }
}

pub fn average_commission(commissions: &[u8]) -> f64 {
    if commissions.is_empty() {
        return 0.0;
    }
    let total: u64 = commissions.iter().map(|c| *c as u64).sum();
    (total as f64) / (commissions.len() as f64)
}

#[async_trait]
impl DataSource for ValidatorsSource {
    fn key(&self) -> MetricKey {
        MetricKey::Validators
    }

    fn description(&self) -> &'static str {
        "getVoteAccounts"
    }

    async fn fetch(&self) -> Result<MetricValue, FetchError> {
        let accounts = self
            .rpc
            .client()
            .get_vote_accounts()
            .await
            .map_err(|e| FetchError::unavailable(self.key().as_str(), e))?;

        let commissions: Vec<u8> = accounts.current.iter().map(|v| v.commission).collect();

        Ok(MetricValue::Validators {
            current: accounts.current.len(),
            delinquent: accounts.delinquent.len(),
            average_commission: average_commission(&commissions),
        })
    }
}

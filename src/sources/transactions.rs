use super::{DataSource, SolanaRpc};
use crate::aggregator::types::{MetricKey, MetricValue};
use crate::errors::FetchError;
use async_trait::async_trait;

/// Lifetime transaction count and throughput of the latest performance sample
pub struct TransactionMetricsSource {
    rpc: SolanaRpc,
}

impl TransactionMetricsSource {
    pub fn new(rpc: SolanaRpc) -> Self {
        Self { rpc }
    }
}

/// Transactions per second over one sample; 0 when the sample period is empty
pub fn transactions_per_second(num_transactions: u64, sample_period_secs: u16) -> f64 {
    if sample_period_secs == 0 {
        return 0.0;
    }
    (num_transactions as f64) / (sample_period_secs as f64)
}

#[async_trait]
impl DataSource for TransactionMetricsSource {
    fn key(&self) -> MetricKey {
        MetricKey::TransactionMetrics
    }

    fn description(&self) -> &'static str {
        "getTransactionCount + getRecentPerformanceSamples"
    }

    async fn fetch(&self) -> Result<MetricValue, FetchError> {
        let name = self.key().as_str();
        let client = self.rpc.client();

        let txn_count = client
            .get_transaction_count()
            .await
            .map_err(|e| FetchError::unavailable(name, e))?;
        let samples = client
            .get_recent_performance_samples(Some(1))
            .await
            .map_err(|e| FetchError::unavailable(name, e))?;

        let txn_per_sec = samples
            .first()
            .map(|sample| {
                transactions_per_second(sample.num_transactions, sample.sample_period_secs)
            })
            .unwrap_or(0.0);

        Ok(MetricValue::TransactionMetrics {
            txn_count,
            txn_per_sec,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tps_from_sample() {
        assert_eq!(transactions_per_second(150_000, 60), 2500.0);
    }

    #[test]
    fn test_tps_with_empty_period() {
        assert_eq!(transactions_per_second(150_000, 0), 0.0);
    }
}

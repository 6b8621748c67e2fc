use super::DataSource;
use crate::aggregator::types::{MetricKey, MetricValue};
use crate::config::PriceConfig;
use crate::errors::FetchError;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const SOURCE_NAME: &str = "price_index";

/// SOL spot price from a CoinGecko-compatible simple price endpoint
pub struct PriceSource {
    http: Client,
    url: String,
    coin_id: String,
    vs_currency: String,
}

impl PriceSource {
    pub fn new(config: &PriceConfig) -> Result<Self, String> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| format!("Failed to build price HTTP client: {}", e))?;

        Ok(Self {
            http,
            url: simple_price_url(config),
            coin_id: config.coin_id.clone(),
            vs_currency: config.vs_currency.clone(),
        })
    }
}

pub fn simple_price_url(config: &PriceConfig) -> String {
    format!(
        "{}/simple/price?ids={}&vs_currencies={}",
        config.base_url.trim_end_matches('/'),
        config.coin_id,
        config.vs_currency
    )
}

/// Extract `body[coin_id][vs_currency]` as a price
pub fn parse_simple_price(body: &Value, coin_id: &str, vs_currency: &str) -> Result<f64, FetchError> {
    let price = body
        .get(coin_id)
        .and_then(|coin| coin.get(vs_currency))
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            FetchError::unavailable(
                SOURCE_NAME,
                format!("response has no {}.{} price", coin_id, vs_currency),
            )
        })?;

    if !price.is_finite() || price < 0.0 {
        return Err(FetchError::unavailable(
            SOURCE_NAME,
            format!("invalid price {}", price),
        ));
    }

    Ok(price)
}

#[async_trait]
impl DataSource for PriceSource {
    fn key(&self) -> MetricKey {
        MetricKey::SolPrice
    }

    fn description(&self) -> &'static str {
        "CoinGecko simple/price"
    }

    async fn fetch(&self) -> Result<MetricValue, FetchError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::unavailable(SOURCE_NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::unavailable(
                SOURCE_NAME,
                format!("HTTP {}", status),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::unavailable(SOURCE_NAME, e))?;

        let usd = parse_simple_price(&body, &self.coin_id, &self.vs_currency)?;
        logger::debug(LogTag::Price, &format!("{} = {} {}", self.coin_id, usd, self.vs_currency));
        Ok(MetricValue::SolPrice { usd })
    }
}

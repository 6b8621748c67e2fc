use crate::config::RpcConfig;
use crate::constants::{DEVNET_RPC_URL, LOCALNET_RPC_URL, MAINNET_RPC_URL, TESTNET_RPC_URL};
use crate::logger::{self, LogTag};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Known clusters, as offered by the wallet network selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cluster {
    Devnet,
    Testnet,
    MainnetBeta,
    Localnet,
}

impl Cluster {
    pub fn rpc_url(&self) -> &'static str {
        match self {
            Cluster::Devnet => DEVNET_RPC_URL,
            Cluster::Testnet => TESTNET_RPC_URL,
            Cluster::MainnetBeta => MAINNET_RPC_URL,
            Cluster::Localnet => LOCALNET_RPC_URL,
        }
    }
}

impl FromStr for Cluster {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "mainnet" | "mainnet-beta" => Ok(Cluster::MainnetBeta),
            "localnet" | "localhost" => Ok(Cluster::Localnet),
            other => Err(format!(
                "Unknown cluster '{}' (expected devnet, testnet, mainnet-beta or localnet)",
                other
            )),
        }
    }
}

/// HTTP and websocket endpoints of one cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub rpc_url: String,
    pub ws_url: String,
}

impl Endpoints {
    /// Explicit URLs win over the named cluster
    pub fn resolve(config: &RpcConfig) -> Result<Self, String> {
        let rpc_url = match &config.url {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => Cluster::from_str(&config.cluster)?.rpc_url().to_string(),
        };

        let ws_url = match &config.ws_url {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => derive_ws_url(&rpc_url)?,
        };

        Ok(Self { rpc_url, ws_url })
    }
}

/// Websocket URL for an RPC URL: http→ws, https→wss, explicit port + 1
pub fn derive_ws_url(rpc_url: &str) -> Result<String, String> {
    let mut url =
        Url::parse(rpc_url).map_err(|e| format!("Invalid RPC URL '{}': {}", rpc_url, e))?;

    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        "ws" | "wss" => return Ok(url.to_string()),
        other => return Err(format!("Unsupported RPC URL scheme '{}'", other)),
    };
    url.set_scheme(scheme)
        .map_err(|_| format!("Cannot derive websocket URL from '{}'", rpc_url))?;

    if let Some(port) = url.port() {
        url.set_port(Some(port.saturating_add(1)))
            .map_err(|_| format!("Cannot derive websocket port from '{}'", rpc_url))?;
    }

    Ok(url.to_string())
}

pub fn parse_commitment(s: &str) -> Result<CommitmentConfig, String> {
    match s.to_lowercase().as_str() {
        "processed" => Ok(CommitmentConfig::processed()),
        "confirmed" => Ok(CommitmentConfig::confirmed()),
        "finalized" => Ok(CommitmentConfig::finalized()),
        other => Err(format!("Unknown commitment '{}'", other)),
    }
}

/// Shared, read-only Solana RPC handle
///
/// Constructed once at startup and cloned into every adapter; cloning only
/// bumps the inner Arc.
#[derive(Clone)]
pub struct SolanaRpc {
    client: Arc<RpcClient>,
    endpoints: Endpoints,
    commitment: CommitmentConfig,
}

impl SolanaRpc {
    pub fn new(endpoints: Endpoints, timeout: Duration, commitment: CommitmentConfig) -> Self {
        let client =
            RpcClient::new_with_timeout_and_commitment(endpoints.rpc_url.clone(), timeout, commitment);

        Self {
            client: Arc::new(client),
            endpoints,
            commitment,
        }
    }

    pub fn from_config(config: &RpcConfig) -> Result<Self, String> {
        let endpoints = Endpoints::resolve(config)?;
        let commitment = parse_commitment(&config.commitment)?;

        logger::info(
            LogTag::Rpc,
            &format!(
                "Using RPC {} (ws={}, commitment={:?}, timeout={}s)",
                endpoints.rpc_url, endpoints.ws_url, commitment.commitment, config.timeout_secs
            ),
        );

        Ok(Self::new(
            endpoints,
            Duration::from_secs(config.timeout_secs.max(1)),
            commitment,
        ))
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Commitment for block and transaction reads, which reject `processed`
    pub fn read_commitment(&self) -> CommitmentConfig {
        match self.commitment.commitment {
            CommitmentLevel::Processed => CommitmentConfig::confirmed(),
            _ => self.commitment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_names() {
        assert_eq!(Cluster::from_str("devnet").unwrap(), Cluster::Devnet);
        assert_eq!(Cluster::from_str("Mainnet").unwrap(), Cluster::MainnetBeta);
        assert_eq!(Cluster::from_str("mainnet-beta").unwrap(), Cluster::MainnetBeta);
        assert!(Cluster::from_str("moonnet").is_err());
    }

    #[test]
    fn test_ws_url_for_public_cluster() {
        assert_eq!(
            derive_ws_url("https://api.devnet.solana.com").unwrap(),
            "wss://api.devnet.solana.com/"
        );
    }

    #[test]
    fn test_ws_url_for_localnet_bumps_port() {
        assert_eq!(
            derive_ws_url("http://127.0.0.1:8899").unwrap(),
            "ws://127.0.0.1:8900/"
        );
    }

    #[test]
    fn test_bad_scheme_is_rejected() {
        assert!(derive_ws_url("ftp://example.com").is_err());
        assert!(derive_ws_url("not a url").is_err());
    }

    #[test]
    fn test_endpoints_prefer_explicit_urls() {
        let config = RpcConfig {
            url: Some("https://rpc.example.com".to_string()),
            ..RpcConfig::default()
        };
        let endpoints = Endpoints::resolve(&config).unwrap();
        assert_eq!(endpoints.rpc_url, "https://rpc.example.com");
        assert_eq!(endpoints.ws_url, "wss://rpc.example.com/");

        let config = RpcConfig {
            cluster: "localnet".to_string(),
            ws_url: Some("ws://10.0.0.2:9000".to_string()),
            ..RpcConfig::default()
        };
        let endpoints = Endpoints::resolve(&config).unwrap();
        assert_eq!(endpoints.rpc_url, "http://127.0.0.1:8899");
        assert_eq!(endpoints.ws_url, "ws://10.0.0.2:9000");
    }

    #[test]
    fn test_commitment_parsing() {
        assert_eq!(
            parse_commitment("finalized").unwrap(),
            CommitmentConfig::finalized()
        );
        assert!(parse_commitment("eventually").is_err());
    }
}

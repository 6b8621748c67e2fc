/// Command-line interface
///
/// Global flags override the matching config file values; `apply_overrides`
/// folds them into a loaded `Config`.
use crate::config::{Config, CONFIG_FILE_PATH};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "solscope")]
#[command(about = "Live Solana network metrics dashboard", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = CONFIG_FILE_PATH)]
    pub config: String,

    /// devnet, testnet, mainnet-beta or localnet
    #[arg(long, global = true)]
    pub cluster: Option<String>,

    /// Explicit RPC URL (overrides --cluster)
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// Explicit websocket URL
    #[arg(long, global = true)]
    pub ws_url: Option<String>,

    /// Enable debug logs for a tag (repeatable), e.g. --debug poller
    #[arg(long = "debug", global = true, value_name = "TAG")]
    pub debug: Vec<String>,

    /// Log everything, including verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Poll all metrics and render the live dashboard until Ctrl-C
    Watch {
        /// Wallet address to refresh alongside the metrics
        #[arg(long)]
        wallet: Option<String>,
    },

    /// Look up one transaction by signature
    Tx {
        signature: String,
    },

    /// Show wallet balances, optionally with recent transactions
    Wallet {
        address: String,

        #[arg(long)]
        history: bool,
    },

    /// Print the effective configuration (file plus flags) as TOML
    Config,
}

impl Cli {
    /// Fold command-line overrides into the loaded config
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(cluster) = &self.cluster {
            config.rpc.cluster = cluster.clone();
            // A named cluster replaces any URL from the file
            config.rpc.url = None;
            config.rpc.ws_url = None;
        }
        if let Some(url) = &self.rpc_url {
            config.rpc.url = Some(url.clone());
        }
        if let Some(url) = &self.ws_url {
            config.rpc.ws_url = Some(url.clone());
        }
        if let Command::Watch {
            wallet: Some(address),
        } = &self.command
        {
            config.wallet.address = Some(address.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_watch_defaults() {
        let cli = parse(&["solscope", "watch"]);
        assert_eq!(cli.config, CONFIG_FILE_PATH);
        assert_eq!(cli.command, Command::Watch { wallet: None });
        assert!(cli.debug.is_empty());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&[
            "solscope",
            "tx",
            "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW",
            "--cluster",
            "mainnet-beta",
            "--debug",
            "rpc",
            "--debug",
            "query",
        ]);
        assert_eq!(cli.cluster.as_deref(), Some("mainnet-beta"));
        assert_eq!(cli.debug, vec!["rpc".to_string(), "query".to_string()]);
        assert!(matches!(cli.command, Command::Tx { .. }));
    }

    #[test]
    fn test_config_command() {
        let cli = parse(&["solscope", "--config", "custom.toml", "config"]);
        assert_eq!(cli.config, "custom.toml");
        assert_eq!(cli.command, Command::Config);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["solscope", "-v", "-q", "watch"]).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.rpc.url = Some("https://from-file.example".to_string());

        let cli = parse(&["solscope", "--cluster", "testnet", "watch", "--wallet", "W1"]);
        cli.apply_overrides(&mut config);
        assert_eq!(config.rpc.cluster, "testnet");
        assert!(config.rpc.url.is_none());
        assert_eq!(config.wallet.address.as_deref(), Some("W1"));

        let cli = parse(&["solscope", "--rpc-url", "http://127.0.0.1:8899", "wallet", "W2", "--history"]);
        cli.apply_overrides(&mut config);
        assert_eq!(config.rpc.url.as_deref(), Some("http://127.0.0.1:8899"));
        assert_eq!(config.wallet.address.as_deref(), Some("W1"));
    }
}

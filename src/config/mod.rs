//! Configuration system
//!
//! `schemas` declares every section with its defaults through `config_struct!`;
//! `utils` loads the optional TOML file.

#[macro_use]
mod macros;
mod schemas;
mod utils;

pub use schemas::{
    Config, DashboardConfig, PollingConfig, PriceConfig, RpcConfig, WalletConfig,
};
pub use utils::{load_config_from_path, parse_config, render_config, CONFIG_FILE_PATH};

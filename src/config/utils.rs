/// Configuration utilities - loading and parsing
///
/// The config file is optional read-only input; missing files fall back to
/// the defaults embedded in the schema definitions.
use super::schemas::Config;
use crate::logger::{self, LogTag};
use std::path::Path;

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "solscope.toml";

/// Load configuration from a specific file path
///
/// # Returns
/// - `Ok(Config)` - parsed file, or defaults when the file does not exist
/// - `Err(String)` - the file exists but could not be read or parsed
pub fn load_config_from_path(path: &str) -> Result<Config, String> {
    if !Path::new(path).exists() {
        logger::info(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path),
        );
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;

    let config = parse_config(&contents)
        .map_err(|e| format!("Failed to parse config file '{}': {}", path, e))?;

    logger::debug(LogTag::Config, &format!("Loaded config from '{}'", path));
    Ok(config)
}

/// Parse a TOML document into a Config (unset fields take defaults)
pub fn parse_config(contents: &str) -> Result<Config, String> {
    toml::from_str::<Config>(contents).map_err(|e| e.to_string())
}

/// Render the effective configuration as TOML (`solscope config`)
pub fn render_config(config: &Config) -> Result<String, String> {
    toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))
}

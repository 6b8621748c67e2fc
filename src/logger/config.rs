/// Logger runtime settings
///
/// Built once from the command line (`--debug <tag>`, `--verbose`, `--quiet`) and
/// readable from any task.
use super::levels::LogLevel;
use super::tags::LogTag;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Messages above this level are dropped
    pub min_level: LogLevel,
    /// Tags with debug output enabled
    pub debug_tags: HashSet<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
        }
    }
}

impl LoggerConfig {
    /// Settings from parsed CLI flags
    pub fn from_flags(debug_tags: &[String], verbose: bool, quiet: bool) -> Self {
        let min_level = if verbose {
            LogLevel::Verbose
        } else if quiet {
            LogLevel::Warning
        } else if !debug_tags.is_empty() {
            LogLevel::Debug
        } else {
            LogLevel::Info
        };

        Self {
            min_level,
            debug_tags: debug_tags.iter().map(|t| t.to_lowercase()).collect(),
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

pub(super) fn is_debug_enabled_for_tag(config: &LoggerConfig, tag: &LogTag) -> bool {
    config.min_level == LogLevel::Verbose
        || config.debug_tags.contains("all")
        || config.debug_tags.contains(&tag.to_debug_key())
}

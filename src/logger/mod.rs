//! Structured console logging for solscope
//!
//! This module provides a small, ergonomic logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-module debug control via `--debug <tag>` flags
//! - Colored, aligned console output with wrapping
//!
//! ## Usage
//!
//! ```ignore
//! use solscope::logger::{self, LogTag};
//!
//! logger::error(LogTag::Rpc, "Connection failed");
//! logger::warning(LogTag::Price, "Price index slow to respond");
//! logger::info(LogTag::Aggregator, "Aggregator started");
//! logger::debug(LogTag::Poller, "tick"); // Only with --debug poller
//! logger::verbose(LogTag::Subscription, "raw slot payload"); // Only with --verbose
//! ```
//!
//! There is no file sink: solscope keeps no state on disk.

mod config;
mod core;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger with the settings derived from the command line
///
/// Call once at startup, before services start. Calling it again replaces the
/// active settings.
pub fn init(config: LoggerConfig) {
    set_logger_config(config);
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (shown unless --quiet)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level
///
/// Debug logs are ONLY shown when `--debug <tag>` is given for that tag.
///
/// # Example
/// ```ignore
/// // Only shown with --debug poller
/// logger::debug(LogTag::Poller, "sol_price fetched in 120ms");
/// ```
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (only with --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

//! Command-line interface parsing for the Pokedex
//!
//! Parses the startup flags with clap and turns them into an `AppConfig`
//! for the rest of the program.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::api::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::catch::DEFAULT_CATCH_RANGE;

/// Default lifetime of cached API responses
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default log file, created in the working directory
pub const DEFAULT_LOG_FILE: &str = "pokedex.log";

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The log level is not one of off, error, warn, info, debug, trace
    #[error("Invalid log level: '{0}'. Valid levels: off, error, warn, info, debug, trace")]
    InvalidLogLevel(String),
    /// A duration flag was zero
    #[error("Invalid {0}: must be at least 1 second")]
    InvalidDuration(&'static str),
    /// The catch range was zero
    #[error("Invalid catch range: must be at least 1")]
    InvalidCatchRange,
}

/// Pokedex - explore the Pokemon world from your terminal
#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "An interactive Pokedex backed by the PokeAPI")]
#[command(version)]
pub struct Cli {
    /// Log verbosity written to the log file (RUST_LOG overrides it)
    ///
    /// Valid levels: off, error, warn, info, debug, trace
    #[arg(long, value_name = "LEVEL", default_value = "off")]
    pub log_level: String,

    /// File that receives log output
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Seconds a cached API response stays fresh
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_CACHE_TTL.as_secs())]
    pub cache_ttl: u64,

    /// Seconds to wait for each API request
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Save file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    pub data_file: Option<PathBuf>,

    /// PokeAPI base URL
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Catch rolls are drawn from 0 up to this value
    #[arg(long, value_name = "N", default_value_t = DEFAULT_CATCH_RANGE)]
    pub catch_range: u32,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub log_level: LevelFilter,
    pub log_file: PathBuf,
    pub cache_ttl: Duration,
    pub timeout: Duration,
    /// Explicit save file; `None` means resolve the default location
    pub data_file: Option<PathBuf>,
    pub base_url: String,
    pub catch_range: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: LevelFilter::OFF,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            cache_ttl: DEFAULT_CACHE_TTL,
            timeout: DEFAULT_TIMEOUT,
            data_file: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            catch_range: DEFAULT_CATCH_RANGE,
        }
    }
}

/// Parses a log level name, ignoring case
pub fn parse_log_level(s: &str) -> Result<LevelFilter, CliError> {
    match s.to_ascii_lowercase().as_str() {
        "off" => Ok(LevelFilter::OFF),
        "error" => Ok(LevelFilter::ERROR),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "info" => Ok(LevelFilter::INFO),
        "debug" => Ok(LevelFilter::DEBUG),
        "trace" => Ok(LevelFilter::TRACE),
        _ => Err(CliError::InvalidLogLevel(s.to_string())),
    }
}

fn seconds(value: u64, name: &'static str) -> Result<Duration, CliError> {
    if value == 0 {
        return Err(CliError::InvalidDuration(name));
    }
    Ok(Duration::from_secs(value))
}

impl AppConfig {
    /// Creates an AppConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(AppConfig)` with validated settings
    /// * `Err(CliError)` if a flag value is out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.catch_range == 0 {
            return Err(CliError::InvalidCatchRange);
        }
        Ok(Self {
            log_level: parse_log_level(&cli.log_level)?,
            log_file: cli.log_file.clone(),
            cache_ttl: seconds(cli.cache_ttl, "cache TTL")?,
            timeout: seconds(cli.timeout, "timeout")?,
            data_file: cli.data_file.clone(),
            base_url: cli.base_url.trim_end_matches('/').to_string(),
            catch_range: cli.catch_range,
        })
    }
}

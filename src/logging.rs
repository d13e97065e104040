//! Log file setup
//!
//! The REPL owns the terminal, so log output goes to an append-mode file.
//! `RUST_LOG` takes precedence over the `--log-level` flag.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Builds the filter from `RUST_LOG`, falling back to `level`
pub fn filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()))
}

/// Installs the global subscriber writing to `log_file`
///
/// Returns `Ok(false)` without touching the file when logging is off and
/// `RUST_LOG` is unset.
pub fn init(level: LevelFilter, log_file: &Path) -> io::Result<bool> {
    if level == LevelFilter::OFF && std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() {
        return Ok(false);
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting pokedex");
    Ok(true)
}

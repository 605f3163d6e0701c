// src/logging.rs

//! Logging setup for `procrun` using `tracing` + `tracing-subscriber`.
//!
//! The chosen level applies to `procrun` itself; everything else (tokio,
//! anything the runner links in) stays at `warn`. Sources, first wins:
//! 1. `--log-level` CLI flag
//! 2. `PROCRUN_LOG`, either a bare level ("debug") or full filter directives
//!    ("info,procrun::sink=trace")
//! 3. `info`
//!
//! Logs go to stderr so forwarded child stdout stays clean.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "PROCRUN_LOG";

const OTHER_CRATES: &str = "warn";

/// Initialise the global log subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let directives = filter_directives(cli_level, env.as_deref());
    let filter = EnvFilter::try_new(&directives)
        .map_err(|e| anyhow::anyhow!("invalid log filter '{directives}': {e}"))?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))?;

    Ok(())
}

/// The `EnvFilter` directive string for the given CLI flag and `PROCRUN_LOG`
/// value.
pub fn filter_directives(cli_level: Option<LogLevel>, env: Option<&str>) -> String {
    if let Some(lvl) = cli_level {
        return crate_directives(level_from_log_level(lvl));
    }
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => match parse_level_str(value) {
            Some(level) => crate_directives(level),
            None if value.contains('=') && EnvFilter::try_new(value).is_ok() => value.to_string(),
            None => crate_directives(Level::INFO),
        },
        None => crate_directives(Level::INFO),
    }
}

fn crate_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("{OTHER_CRATES},{}={level}", env!("CARGO_CRATE_NAME"))
}

fn level_from_log_level(lvl: LogLevel) -> Level {
    match lvl {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

/// Parse a bare level name as accepted by `PROCRUN_LOG`.
pub fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::StdinMode;

/// Command-line arguments for `procrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "procrun",
    version,
    about = "Run a command with managed output, log rotation and an optional run-as user.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Procrun.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Working directory for the command (overrides `dir`).
    #[arg(long, value_name = "DIR")]
    pub dir: Option<String>,

    /// Run the command as this user (overrides `user`).
    #[arg(long, value_name = "NAME")]
    pub user: Option<String>,

    /// Stdin for the command: `null` or `inherit` (overrides `stdin`).
    #[arg(long, value_name = "MODE")]
    pub stdin: Option<StdinMode>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROCRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved invocation, but don't run it.
    #[arg(long)]
    pub dry_run: bool,

    /// Command and arguments; override `command` and `args` from the config.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

// src/errors.rs

//! Crate-wide error types.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The configured run-as-user could not be resolved.
    #[error("cannot resolve user '{user}': {source}")]
    CredentialResolution {
        user: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The directory for a rotating log file could not be created.
    #[error("cannot create log directory <{}>: {source}", .dir.display())]
    LogSinkCreation {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The OS refused to create the process.
    #[error("failed to spawn '{command}': {source}")]
    ProcessSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and did not exit cleanly.
    #[error(transparent)]
    ProcessExit(#[from] ExitError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// How a finished process failed.
///
/// Cloneable so a single result can be handed to every waiter of a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}")]
pub struct ExitError {
    pub kind: ExitKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitKind {
    /// Exited with a non-zero status code.
    Code(i32),
    /// Terminated by a signal (unix only).
    Signal(i32),
    /// Waiting on the process itself failed.
    Wait(String),
    /// The process exited cleanly but its output could not be written.
    Output(String),
}

impl ExitError {
    pub fn code(&self) -> Option<i32> {
        match self.kind {
            ExitKind::Code(code) => Some(code),
            _ => None,
        }
    }
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitKind::Code(code) => write!(f, "process exited with status {code}"),
            ExitKind::Signal(sig) => write!(f, "process terminated by signal {sig}"),
            ExitKind::Wait(msg) => write!(f, "waiting for process failed: {msg}"),
            ExitKind::Output(msg) => write!(f, "writing process output failed: {msg}"),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunnerError>;

// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Lifecycle state of a [`Runner`](crate::exec::Runner).
///
/// - `Stopped`: no live process (initial state, and again after every exit).
/// - `Started`: a process is running and owned by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Stopped,
    Started,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Stopped => f.write_str("stopped"),
            RunState::Started => f.write_str("started"),
        }
    }
}

/// Where the child's stdin comes from when no file is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdinMode {
    /// Connect stdin to the null device.
    #[default]
    Null,
    /// Share this process's stdin.
    Inherit,
}

impl FromStr for StdinMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "null" => Ok(StdinMode::Null),
            "inherit" => Ok(StdinMode::Inherit),
            other => Err(format!(
                "invalid stdin: {other} (expected \"null\" or \"inherit\")"
            )),
        }
    }
}

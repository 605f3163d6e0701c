// src/config/model.rs

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use crate::sink::{ConsoleSink, SharedSink};
use crate::types::StdinMode;

/// Everything a [`Runner`](crate::exec::Runner) needs to start a process.
///
/// The runner copies what it needs on every `start`, so the config itself is
/// never mutated.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Working directory. `None` (or an empty path) means the current
    /// directory at the time of `start`.
    pub dir: Option<PathBuf>,

    pub command: String,
    pub args: Vec<String>,

    /// `KEY=VALUE` entries for the child. Unless `inherit_env` is set this is
    /// the child's entire environment.
    pub env: Vec<String>,

    /// Layer `env` over this process's environment instead of replacing it.
    pub inherit_env: bool,

    pub stdin: InputSource,
    pub stdout: OutputConfig,
    pub stderr: OutputConfig,

    /// Send stderr into exactly the same destination as stdout.
    pub redirect_stderr: bool,

    /// Run the child as this user (unix only).
    pub user: Option<String>,
}

impl RunnerConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }
}

/// Source for the child's stdin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InputSource {
    #[default]
    Null,
    Inherit,
    File(PathBuf),
}

/// Destination(s) for one output stream.
#[derive(Clone, Default)]
pub struct OutputConfig {
    /// A sink supplied by the caller. The runner writes to it but never
    /// closes it.
    pub sink: Option<SharedSink>,

    /// A rotating log file owned by the runner for the duration of a run.
    pub file: Option<RotateSpec>,
}

impl OutputConfig {
    pub fn is_empty(&self) -> bool {
        self.sink.is_none() && self.file.is_none()
    }
}

impl fmt::Debug for OutputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputConfig")
            .field("sink", &self.sink.as_ref().map(|_| "<sink>"))
            .field("file", &self.file)
            .finish()
    }
}

/// Rotating log file settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotateSpec {
    /// Relative paths are resolved against the runner's working directory.
    pub path: PathBuf,
    /// Maximum size of a single file in megabytes (0 = 100 MB).
    pub max_size_mb: u64,
    /// Days to keep backups (0 = forever).
    pub max_age_days: u64,
    /// Number of backups to keep (0 = all).
    pub max_backups: usize,
}

impl RotateSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Top-level TOML file as read from disk.
///
/// ```toml
/// dir = "/srv/app"
/// command = "python3"
/// args = ["app.py"]
/// env = ["PORT=8080"]
/// user = "app"
/// redirect_stderr = true
///
/// [stdout]
/// console = true
/// file = "logs/app.log"
/// max_size = 50
/// max_age = 7
/// max_backups = 3
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawRunnerFile {
    #[serde(default)]
    pub dir: Option<String>,

    /// May be left empty when the command is given on the command line.
    #[serde(default)]
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub env: Vec<String>,

    #[serde(default)]
    pub inherit_env: bool,

    #[serde(default)]
    pub user: Option<String>,

    /// `"null"` (default) or `"inherit"`.
    #[serde(default)]
    pub stdin: StdinMode,

    /// Read stdin from this file; takes precedence over `stdin`.
    #[serde(default)]
    pub stdin_file: Option<String>,

    #[serde(default)]
    pub redirect_stderr: bool,

    #[serde(default)]
    pub stdout: OutputSection,

    #[serde(default)]
    pub stderr: OutputSection,
}

/// `[stdout]` / `[stderr]` sections.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputSection {
    /// Forward to this process's own stream.
    #[serde(default)]
    pub console: bool,

    #[serde(default)]
    pub file: Option<String>,

    /// Megabytes.
    #[serde(default)]
    pub max_size: u64,

    /// Days.
    #[serde(default)]
    pub max_age: u64,

    #[serde(default)]
    pub max_backups: usize,
}

/// A validated [`RawRunnerFile`].
///
/// Only constructible through `TryFrom<RawRunnerFile>` (see
/// [`validate`](crate::config::validate)).
#[derive(Debug, Clone)]
pub struct RunnerFile {
    raw: RawRunnerFile,
}

impl RunnerFile {
    pub(crate) fn new_unchecked(raw: RawRunnerFile) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &RawRunnerFile {
        &self.raw
    }

    /// Build the library config, wiring `console = true` to our own
    /// stdout/stderr.
    pub fn into_runner_config(self) -> RunnerConfig {
        let raw = self.raw;

        let stdin = match raw.stdin_file {
            Some(path) => InputSource::File(PathBuf::from(path)),
            None => match raw.stdin {
                StdinMode::Null => InputSource::Null,
                StdinMode::Inherit => InputSource::Inherit,
            },
        };

        RunnerConfig {
            dir: raw.dir.filter(|d| !d.is_empty()).map(PathBuf::from),
            command: raw.command,
            args: raw.args,
            env: raw.env,
            inherit_env: raw.inherit_env,
            stdin,
            stdout: output_config(raw.stdout, ConsoleSink::stdout()),
            stderr: output_config(raw.stderr, ConsoleSink::stderr()),
            redirect_stderr: raw.redirect_stderr,
            user: raw.user,
        }
    }
}

fn output_config(section: OutputSection, console: ConsoleSink) -> OutputConfig {
    OutputConfig {
        sink: section
            .console
            .then(|| std::sync::Arc::new(console) as SharedSink),
        file: section.file.map(|path| RotateSpec {
            path: PathBuf::from(path),
            max_size_mb: section.max_size,
            max_age_days: section.max_age,
            max_backups: section.max_backups,
        }),
    }
}

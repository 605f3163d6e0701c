#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use procrun::config::{InputSource, RotateSpec, RunnerConfig};
use procrun::sink::SharedSink;

use crate::sinks::MemorySink;

/// Builder for `RunnerConfig` to simplify test setup.
pub struct RunnerConfigBuilder {
    config: RunnerConfig,
}

impl RunnerConfigBuilder {
    pub fn new(command: &str) -> Self {
        Self {
            config: RunnerConfig::new(command),
        }
    }

    /// `sh -c <script>`.
    pub fn shell(script: &str) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.config.args.push(arg.to_string());
        self
    }

    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.dir = Some(dir.into());
        self
    }

    pub fn env(mut self, entry: &str) -> Self {
        self.config.env.push(entry.to_string());
        self
    }

    pub fn inherit_env(mut self, val: bool) -> Self {
        self.config.inherit_env = val;
        self
    }

    pub fn stdin_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.stdin = InputSource::File(path.into());
        self
    }

    pub fn stdout_sink(mut self, sink: &Arc<MemorySink>) -> Self {
        self.config.stdout.sink = Some(Arc::clone(sink) as SharedSink);
        self
    }

    pub fn stderr_sink(mut self, sink: &Arc<MemorySink>) -> Self {
        self.config.stderr.sink = Some(Arc::clone(sink) as SharedSink);
        self
    }

    pub fn stdout_file(mut self, spec: RotateSpec) -> Self {
        self.config.stdout.file = Some(spec);
        self
    }

    pub fn stderr_file(mut self, spec: RotateSpec) -> Self {
        self.config.stderr.file = Some(spec);
        self
    }

    pub fn redirect_stderr(mut self, val: bool) -> Self {
        self.config.redirect_stderr = val;
        self
    }

    pub fn user(mut self, name: &str) -> Self {
        self.config.user = Some(name.to_string());
        self
    }

    pub fn build(self) -> RunnerConfig {
        self.config
    }
}

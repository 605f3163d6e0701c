// src/sink/builder.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::RotateSpec;
use crate::errors::{Result, RunnerError};
use crate::sink::SharedSink;
use crate::sink::rotating::{RotatingFile, RotationPolicy};

/// Builds the log sinks a runner owns for the duration of one run.
pub trait SinkFactory: Send + Sync {
    fn build(&self, base_dir: &Path, spec: &RotateSpec) -> Result<SharedSink>;
}

/// Rotating files on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RotatingSinkFactory;

impl SinkFactory for RotatingSinkFactory {
    fn build(&self, base_dir: &Path, spec: &RotateSpec) -> Result<SharedSink> {
        Ok(std::sync::Arc::new(build_rotating_sink(base_dir, spec)?))
    }
}

/// Resolve `path` against `base_dir` unless it is already absolute.
pub fn resolve_against(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Build the rotating log sink described by `spec`.
///
/// The parent directory of the resolved path (and any missing ancestors) is
/// created up front so a bad location fails `start` instead of the first
/// write.
pub fn build_rotating_sink(base_dir: &Path, spec: &RotateSpec) -> Result<RotatingFile> {
    let path = resolve_against(base_dir, &spec.path);

    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| RunnerError::LogSinkCreation {
            dir: dir.to_path_buf(),
            source,
        })?;
    }

    debug!(
        path = %path.display(),
        max_size_mb = spec.max_size_mb,
        max_age_days = spec.max_age_days,
        max_backups = spec.max_backups,
        "log sink ready"
    );

    Ok(RotatingFile::new(
        path,
        RotationPolicy {
            max_size_mb: spec.max_size_mb,
            max_age_days: spec.max_age_days,
            max_backups: spec.max_backups,
        },
    ))
}

// src/sink/rotating.rs

//! Size/age/count bounded log file.
//!
//! Writes go to `path`. When a write would push the file past `max_size_mb`
//! the current file is renamed to a timestamped backup next to it:
//!
//! ```text
//! logs/out.log  ->  logs/out-2024-05-01T13-04-05.123.log
//! ```
//!
//! and a fresh `out.log` is started. After each rotation, backups beyond
//! `max_backups` and backups older than `max_age_days` are deleted. A zero
//! value disables the respective limit (for size: falls back to 100 MB).
//! Timestamps use local wall-clock time.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{Local, NaiveDateTime, TimeDelta};
use tracing::{debug, warn};

use super::Sink;

const MEGABYTE: u64 = 1024 * 1024;
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

/// Rotation policy for a [`RotatingFile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_size_mb: u64,
    pub max_age_days: u64,
    pub max_backups: usize,
}

#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    policy: RotationPolicy,
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    file: Option<File>,
    size: u64,
}

impl RotatingFile {
    /// Create the sink. Nothing is opened until the first write.
    pub fn new(path: impl Into<PathBuf>, policy: RotationPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    fn max_size(&self) -> u64 {
        let mb = if self.policy.max_size_mb == 0 {
            DEFAULT_MAX_SIZE_MB
        } else {
            self.policy.max_size_mb
        };
        mb.saturating_mul(MEGABYTE)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Rotate now, regardless of the current size.
    pub fn rotate(&self) -> io::Result<()> {
        let mut inner = self.lock();
        self.rotate_locked(&mut inner)
    }

    fn open_existing_or_new(&self, inner: &mut Inner, write_len: u64) -> io::Result<()> {
        match fs::metadata(&self.path) {
            Ok(meta) if meta.len() + write_len < self.max_size() => {
                let file = OpenOptions::new().append(true).open(&self.path)?;
                inner.file = Some(file);
                inner.size = meta.len();
                Ok(())
            }
            Ok(_) => self.rotate_locked(inner),
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.open_new(inner),
            Err(e) => Err(e),
        }
    }

    fn open_new(&self, inner: &mut Inner) -> io::Result<()> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        inner.file = Some(file);
        inner.size = 0;
        Ok(())
    }

    fn rotate_locked(&self, inner: &mut Inner) -> io::Result<()> {
        inner.file = None;

        if self.path.exists() {
            let backup = self.backup_name(Local::now().naive_local());
            fs::rename(&self.path, &backup)?;
            debug!(path = %self.path.display(), backup = %backup.display(), "rotated log file");
        }

        self.open_new(inner)?;
        self.prune_backups();
        Ok(())
    }

    fn name_parts(&self) -> (String, String) {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self
            .path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (stem, ext)
    }

    fn backup_name(&self, at: NaiveDateTime) -> PathBuf {
        let (stem, ext) = self.name_parts();
        let name = format!("{stem}-{}{ext}", at.format(BACKUP_TIME_FORMAT));
        self.path.with_file_name(name)
    }

    /// Existing backups of this file, newest first.
    pub fn backups(&self) -> io::Result<Vec<(PathBuf, NaiveDateTime)>> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let (stem, ext) = self.name_parts();
        let prefix = format!("{stem}-");

        let mut found = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(stamp) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&ext))
            else {
                continue;
            };
            if let Ok(at) = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT) {
                found.push((entry.path(), at));
            }
        }

        found.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(found)
    }

    fn prune_backups(&self) {
        let backups = match self.backups() {
            Ok(b) => b,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "listing log backups failed");
                return;
            }
        };

        let cutoff = (self.policy.max_age_days > 0).then(|| {
            Local::now().naive_local() - TimeDelta::days(self.policy.max_age_days as i64)
        });

        for (idx, (path, at)) in backups.iter().enumerate() {
            let too_many = self.policy.max_backups > 0 && idx >= self.policy.max_backups;
            let too_old = cutoff.is_some_and(|c| *at < c);
            if too_many || too_old {
                if let Err(e) = fs::remove_file(path) {
                    warn!(path = %path.display(), error = %e, "removing log backup failed");
                }
            }
        }
    }
}

impl Sink for RotatingFile {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        let write_len = buf.len() as u64;

        if write_len > self.max_size() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "write length {} exceeds maximum file size {}",
                    write_len,
                    self.max_size()
                ),
            ));
        }

        if inner.file.is_none() {
            self.open_existing_or_new(&mut inner, write_len)?;
        }
        if inner.size + write_len > self.max_size() {
            self.rotate_locked(&mut inner)?;
        }

        let file = inner
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("log file not open"))?;
        file.write_all(buf)?;
        inner.size += write_len;
        Ok(buf.len())
    }

    fn flush(&self) -> io::Result<()> {
        match self.lock().file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn close(&self) -> io::Result<()> {
        let mut inner = self.lock();
        if let Some(file) = inner.file.take() {
            file.sync_all()?;
        }
        Ok(())
    }
}

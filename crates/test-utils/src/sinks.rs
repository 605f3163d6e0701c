use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use procrun::config::RotateSpec;
use procrun::errors::RunnerError;
use procrun::sink::{SharedSink, Sink, SinkFactory};

/// Records everything written to it; can be told to misbehave.
#[derive(Debug, Default)]
pub struct MemorySink {
    chunks: Mutex<Vec<Vec<u8>>>,
    write_calls: AtomicUsize,
    close_calls: AtomicUsize,
    fail_write: Option<String>,
    fail_close: Option<String>,
    short_write: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write returns an error with this message.
    pub fn fail_writes(mut self, msg: &str) -> Self {
        self.fail_write = Some(msg.to_string());
        self
    }

    /// Every write accepts one byte less than offered.
    pub fn short_writes(mut self) -> Self {
        self.short_write = true;
        self
    }

    /// `close` returns an error with this message.
    pub fn fail_close(mut self, msg: &str) -> Self {
        self.fail_close = Some(msg.to_string());
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Everything successfully written, concatenated.
    pub fn contents(&self) -> Vec<u8> {
        self.chunks.lock().unwrap().concat()
    }

    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    /// One entry per successful write call.
    pub fn chunks(&self) -> Vec<Vec<u8>> {
        self.chunks.lock().unwrap().clone()
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

impl Sink for MemorySink {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = &self.fail_write {
            return Err(io::Error::other(msg.clone()));
        }
        let n = if self.short_write {
            buf.len().saturating_sub(1)
        } else {
            buf.len()
        };
        self.chunks.lock().unwrap().push(buf[..n].to_vec());
        Ok(n)
    }

    fn close(&self) -> io::Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_close {
            Some(msg) => Err(io::Error::other(msg.clone())),
            None => Ok(()),
        }
    }
}

/// Upcast helper for building sink lists.
pub fn shared(sink: &Arc<MemorySink>) -> SharedSink {
    Arc::clone(sink) as SharedSink
}

/// A [`SinkFactory`] that hands out [`MemorySink`]s and remembers them.
///
/// Paths registered with [`RecordingSinkFactory::fail_on`] fail the way an
/// uncreatable log directory does.
#[derive(Debug, Default)]
pub struct RecordingSinkFactory {
    built: Mutex<Vec<(PathBuf, Arc<MemorySink>)>>,
    failing: Vec<PathBuf>,
}

impl RecordingSinkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing.push(path.into());
        self
    }

    /// Sinks built so far, in build order, keyed by the configured path.
    pub fn built(&self) -> Vec<(PathBuf, Arc<MemorySink>)> {
        self.built.lock().unwrap().clone()
    }

    /// The sink built for `path`, if any.
    pub fn sink_for(&self, path: impl AsRef<Path>) -> Option<Arc<MemorySink>> {
        self.built()
            .into_iter()
            .find(|(p, _)| p == path.as_ref())
            .map(|(_, sink)| sink)
    }
}

impl SinkFactory for RecordingSinkFactory {
    fn build(&self, base_dir: &Path, spec: &RotateSpec) -> procrun::errors::Result<SharedSink> {
        if self.failing.contains(&spec.path) {
            return Err(RunnerError::LogSinkCreation {
                dir: base_dir.join(&spec.path),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "not allowed"),
            });
        }
        let sink = MemorySink::new().shared();
        self.built
            .lock()
            .unwrap()
            .push((spec.path.clone(), Arc::clone(&sink)));
        Ok(sink)
    }
}

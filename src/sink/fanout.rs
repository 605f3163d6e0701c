// src/sink/fanout.rs

//! Fan-out writer: one logical stream, many sinks.
//!
//! A write goes to every sink in construction order and stops at the first
//! sink that fails or accepts fewer bytes than it was given. Sinks before the
//! failing one keep what they received; sinks after it are never called.
//!
//! In synchronized mode a single lock serializes whole `write` calls, so two
//! producers sharing the writer (merged stdout/stderr) never interleave inside
//! one call on any sink.

use std::io;
use std::sync::Mutex;

use super::{SharedSink, Sink};

pub struct FanoutWriter {
    sinks: Vec<SharedSink>,
    lock: Option<Mutex<()>>,
}

impl FanoutWriter {
    pub fn new(sinks: impl IntoIterator<Item = SharedSink>) -> Self {
        Self {
            sinks: sinks.into_iter().collect(),
            lock: None,
        }
    }

    /// Serialize concurrent writes under one lock.
    pub fn synchronized(mut self) -> Self {
        self.lock = Some(Mutex::new(()));
        self
    }

    pub fn is_synchronized(&self) -> bool {
        self.lock.is_some()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn write_all_sinks(&self, buf: &[u8]) -> io::Result<usize> {
        for sink in &self.sinks {
            let n = sink.write(buf)?;
            if n != buf.len() {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "short write"));
            }
        }
        Ok(buf.len())
    }

    /// Close every sink, even when some of them fail.
    ///
    /// A single failure is returned unchanged; several are folded into one
    /// error listing each message in sink order.
    pub fn close_all(&self) -> io::Result<()> {
        let mut errors: Vec<io::Error> = self
            .sinks
            .iter()
            .filter_map(|sink| sink.close().err())
            .collect();

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => {
                let kind = errors[0].kind();
                let joined = errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(io::Error::new(kind, joined))
            }
        }
    }
}

impl Sink for FanoutWriter {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        match &self.lock {
            Some(lock) => {
                // A poisoned lock only means another writer panicked mid-call.
                let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
                self.write_all_sinks(buf)
            }
            None => self.write_all_sinks(buf),
        }
    }

    fn flush(&self) -> io::Result<()> {
        for sink in &self.sinks {
            sink.flush()?;
        }
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        self.close_all()
    }
}

impl io::Write for FanoutWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Sink::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Sink::flush(self)
    }
}

impl std::fmt::Debug for FanoutWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutWriter")
            .field("sinks", &self.sinks.len())
            .field("synchronized", &self.is_synchronized())
            .finish()
    }
}

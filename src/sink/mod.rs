// src/sink/mod.rs

//! Output destinations for child process streams.
//!
//! - [`fanout`] duplicates one stream across several sinks.
//! - [`rotating`] is a size/age/count bounded log file.
//! - [`builder`] resolves a log path and builds a [`RotatingFile`] for it;
//!   [`SinkFactory`] is the seam the runner builds its log sinks through.
//! - [`console`] forwards to this process's own stdout/stderr.
//!
//! Sinks take `&self` so a single handle can be shared between the runner,
//! the output pumps and whoever supplied it. Implementations do their own
//! locking.

use std::io;
use std::sync::Arc;

pub mod builder;
pub mod console;
pub mod fanout;
pub mod rotating;

pub use builder::{RotatingSinkFactory, SinkFactory, build_rotating_sink, resolve_against};
pub use console::ConsoleSink;
pub use fanout::FanoutWriter;
pub use rotating::RotatingFile;

/// A closable byte sink.
pub trait Sink: Send + Sync {
    /// Write `buf`, returning how many bytes were accepted.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Shared handle to a sink.
pub type SharedSink = Arc<dyn Sink>;

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }

    fn close(&self) -> io::Result<()> {
        (**self).close()
    }
}

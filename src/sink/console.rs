// src/sink/console.rs

use std::io::{self, Write};

use super::Sink;

/// Which of our own streams a [`ConsoleSink`] forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

/// Direct sink writing to this process's stdout or stderr.
///
/// `close` only flushes; the console itself is never closed.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    stream: ConsoleStream,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self {
            stream: ConsoleStream::Stdout,
        }
    }

    pub fn stderr() -> Self {
        Self {
            stream: ConsoleStream::Stderr,
        }
    }

    pub fn stream(&self) -> ConsoleStream {
        self.stream
    }
}

impl Sink for ConsoleSink {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        match self.stream {
            ConsoleStream::Stdout => io::stdout().lock().write_all(buf)?,
            ConsoleStream::Stderr => io::stderr().lock().write_all(buf)?,
        }
        Ok(buf.len())
    }

    fn flush(&self) -> io::Result<()> {
        match self.stream {
            ConsoleStream::Stdout => io::stdout().flush(),
            ConsoleStream::Stderr => io::stderr().flush(),
        }
    }

    fn close(&self) -> io::Result<()> {
        self.flush()
    }
}

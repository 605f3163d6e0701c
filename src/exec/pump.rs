// src/exec/pump.rs

//! Copy a child's piped output into its fan-out writer.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::sink::{FanoutWriter, Sink};

const CHUNK_SIZE: usize = 32 * 1024;

/// Spawn a task that reads `reader` until EOF, handing each chunk to
/// `writer` as one `write` call.
///
/// After the first write failure the rest of the stream is read and dropped,
/// so the child never stalls on a full pipe. That first failure is the
/// task's output.
pub fn spawn_pump<R>(
    stream: &'static str,
    reader: R,
    writer: Arc<FanoutWriter>,
) -> JoinHandle<Option<io::Error>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = reader;
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut failure: Option<io::Error> = None;
        let mut copied: u64 = 0;

        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if failure.is_some() {
                        continue;
                    }
                    match writer.write(&buf[..n]) {
                        Ok(_) => copied += n as u64,
                        Err(e) => {
                            warn!(stream, error = %e, "writing process output failed; discarding the rest");
                            failure = Some(e);
                        }
                    }
                }
                Err(e) => {
                    warn!(stream, error = %e, "reading process output failed");
                    break;
                }
            }
        }

        if let Err(e) = writer.flush() {
            debug!(stream, error = %e, "flushing output sinks failed");
        }
        debug!(stream, bytes = copied, "output pump finished");
        failure
    })
}

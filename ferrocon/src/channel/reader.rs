//! Background worker draining device output into the line queue.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace, warn};
use tokio::sync::watch;

use super::buffer::LineBuffer;
use super::queue::LineQueue;
use crate::error::{Error, Result, TransportError};
use crate::transport::TransportReader;

/// Turns the transport's byte stream into lines on the [`LineQueue`].
///
/// The reader is the queue's only producer. It polls the transport with a
/// bounded timeout so that a stop request is noticed within one
/// `read_timeout` interval.
pub struct LineReader {
    transport: TransportReader,
    buffer: LineBuffer,
    queue: Arc<LineQueue>,
    read_timeout: Duration,
    partial_flush: Duration,
    chunk: Box<[u8]>,
}

impl LineReader {
    /// Create a reader over `transport` publishing into `queue`.
    pub fn new(
        transport: TransportReader,
        queue: Arc<LineQueue>,
        read_timeout: Duration,
        partial_flush: Duration,
    ) -> Self {
        Self {
            transport,
            buffer: LineBuffer::new(),
            queue,
            read_timeout,
            partial_flush,
            chunk: vec![0u8; 1024].into_boxed_slice(),
        }
    }

    /// Read the next line, or `None` if none completed.
    ///
    /// Returns after at most one transport read, so a console that keeps
    /// sending unterminated output still yields `None` between chunks.
    /// Cancel safe: partial data stays in the internal buffer.
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.buffer.next_line() {
            return Ok(Some(line));
        }

        match tokio::time::timeout(self.read_timeout, self.transport.read(&mut self.chunk)).await {
            Ok(Ok(n)) => {
                self.buffer.extend(&self.chunk[..n]);
                Ok(self.buffer.next_line())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(self.buffer.flush_stale(self.partial_flush)),
        }
    }

    /// Run until `stop` flips to true or the device hangs up.
    ///
    /// Returns the transport half so the session can close the stream.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> TransportReader {
        debug!("reader: started on {}", self.transport.name());

        loop {
            if *stop.borrow_and_update() {
                break;
            }

            match self.read_line().await {
                Ok(Some(line)) if line.is_empty() => {}
                Ok(Some(line)) => {
                    trace!("reader: {:?}", line);
                    self.queue.push(line);
                }
                Ok(None) => {}
                Err(Error::Transport(TransportError::Disconnected)) => {
                    warn!("reader: {} disconnected", self.transport.name());
                    break;
                }
                Err(e) => {
                    warn!("reader: read failed on {}: {}", self.transport.name(), e);
                    tokio::time::sleep(self.read_timeout).await;
                }
            }
        }

        if let Some(rest) = self.buffer.flush_stale(Duration::ZERO) {
            if !rest.is_empty() {
                self.queue.push(rest);
            }
        }
        self.queue.close();
        debug!("reader: stopped");
        self.transport
    }
}

//! Line assembly buffer for raw console output.
//!
//! Serial consoles deliver output in arbitrary fragments: half a line, three
//! lines at once, a prompt that never gets a terminator. `LineBuffer`
//! accumulates those fragments and hands back complete lines, splitting on
//! either `\r` or `\n` and stripping ANSI escape codes from each line.

use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::time::Instant;

/// Buffer that turns a byte stream into discrete lines.
#[derive(Debug)]
pub struct LineBuffer {
    /// Bytes received but not yet returned as a line.
    pending: BytesMut,

    /// When the last byte was appended.
    last_activity: Instant,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            pending: BytesMut::with_capacity(1024),
            last_activity: Instant::now(),
        }
    }

    /// Append newly received bytes.
    pub fn extend(&mut self, data: &[u8]) {
        self.pending.extend_from_slice(data);
        self.last_activity = Instant::now();
    }

    /// Pop the next complete line, if one is buffered.
    ///
    /// A `\r\n` pair yields the line followed by an empty line; callers
    /// skip empty lines.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = memchr::memchr2(b'\r', b'\n', &self.pending)?;
        let raw = self.pending.split_to(pos);
        self.pending.advance(1);
        Some(clean(&raw))
    }

    /// Return the unterminated remainder if no byte arrived for `idle`.
    ///
    /// Prompts and countdown banners are often never terminated; this lets
    /// them reach the line queue anyway.
    pub fn flush_stale(&mut self, idle: Duration) -> Option<String> {
        if self.pending.is_empty() || self.last_activity.elapsed() < idle {
            return None;
        }
        let raw = self.pending.split();
        Some(clean(&raw))
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop any buffered bytes.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip escape codes and trailing whitespace, decoding lossily.
fn clean(raw: &[u8]) -> String {
    let stripped = strip_ansi_escapes::strip(raw);
    String::from_utf8_lossy(&stripped).trim_end().to_string()
}

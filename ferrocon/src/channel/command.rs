//! Controller-side façade over the line and command queues.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use log::{debug, trace};
use tokio::sync::mpsc;

use super::landmark::Landmark;
use super::queue::LineQueue;
use super::writer::Outbound;
use crate::error::{ChannelError, Result};

/// Configuration for command channel behavior.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Appended to every command sent with a terminator.
    pub terminator: Bytes,

    /// Default bound for waits. `None` waits forever.
    pub wait_timeout: Option<Duration>,

    /// How long a single transport read blocks before the reader checks
    /// for a stop request.
    pub read_timeout: Duration,

    /// Idle time after which an unterminated line is published anyway.
    pub partial_flush: Duration,

    /// Pause between repeated keystrokes.
    pub keystroke_delay: Duration,

    /// Pause between polls when waiting for output without blocking.
    pub poll_interval: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            terminator: Bytes::from_static(b"\r"),
            wait_timeout: None,
            read_timeout: Duration::from_millis(100),
            partial_flush: Duration::from_millis(500),
            keystroke_delay: Duration::from_millis(100),
            poll_interval: Duration::from_millis(50),
        }
    }
}

/// Synchronous-looking command/response interface used by the controller.
///
/// `send` only enqueues; the writer worker does the I/O. Waits pop lines
/// produced by the reader worker.
#[derive(Debug, Clone)]
pub struct CommandChannel {
    commands: mpsc::UnboundedSender<Outbound>,
    lines: Arc<LineQueue>,
    terminator: Bytes,
}

impl CommandChannel {
    /// Create a channel over the given queues.
    pub fn new(
        commands: mpsc::UnboundedSender<Outbound>,
        lines: Arc<LineQueue>,
        terminator: Bytes,
    ) -> Self {
        Self {
            commands,
            lines,
            terminator,
        }
    }

    fn enqueue(&self, outbound: Outbound) -> Result<()> {
        self.commands
            .send(outbound)
            .map_err(|_| ChannelError::Closed)?;
        Ok(())
    }

    /// Enqueue a command, optionally followed by the line terminator.
    pub fn send(&self, command: &str, with_terminator: bool) -> Result<()> {
        debug!("channel: send {:?}", command);
        let payload = Bytes::copy_from_slice(command.as_bytes());
        if with_terminator {
            self.enqueue(Outbound::line(payload, self.terminator.clone()))
        } else {
            self.enqueue(Outbound::raw(payload))
        }
    }

    /// Enqueue raw bytes with no terminator.
    pub fn send_bytes(&self, bytes: impl Into<Bytes>) -> Result<()> {
        self.enqueue(Outbound::raw(bytes))
    }

    /// Enqueue a bare terminator.
    pub fn send_terminator(&self) -> Result<()> {
        self.enqueue(Outbound::raw(self.terminator.clone()))
    }

    /// Drop every line not yet consumed. Returns how many were dropped.
    pub fn discard_pending(&self) -> usize {
        let dropped = self.lines.drain();
        if dropped > 0 {
            trace!("channel: discarded {} stale lines", dropped);
        }
        dropped
    }

    /// Pop the next queued line without waiting.
    ///
    /// `Ok(None)` means nothing has arrived yet. Fails with
    /// [`ChannelError::Closed`] once the reader is gone and the queue is
    /// empty.
    pub fn read_line(&self) -> Result<Option<String>> {
        match self.lines.try_pop() {
            Some(line) => Ok(Some(line)),
            None if self.lines.is_closed() => Err(ChannelError::Closed.into()),
            None => Ok(None),
        }
    }

    /// Pop the next line, waiting up to `timeout` (or forever).
    pub async fn next_line(&self, timeout: Option<Duration>) -> Result<String> {
        let pop = async { self.lines.pop().await.ok_or(ChannelError::Closed) };
        let line = match timeout {
            Some(limit) => tokio::time::timeout(limit, pop)
                .await
                .map_err(|_| ChannelError::Timeout(limit))??,
            None => pop.await?,
        };
        Ok(line)
    }

    /// Consume lines until one matches `landmark`, returning that line.
    ///
    /// Lines that do not match are dropped. With `timeout` set, fails with
    /// [`ChannelError::Timeout`] once it elapses; otherwise waits as long as
    /// the device takes.
    pub async fn wait_for(&self, landmark: &Landmark, timeout: Option<Duration>) -> Result<String> {
        let scan = async {
            loop {
                let line = self.lines.pop().await.ok_or(ChannelError::Closed)?;
                if landmark.matches(&line) {
                    return Ok::<_, ChannelError>(line);
                }
                trace!("channel: skip {:?} waiting for {}", line, landmark);
            }
        };

        let line = match timeout {
            Some(limit) => tokio::time::timeout(limit, scan)
                .await
                .map_err(|_| ChannelError::Timeout(limit))??,
            None => scan.await?,
        };

        debug!("channel: matched {} in {:?}", landmark, line);
        Ok(line)
    }

    /// Whether the writer worker is still accepting commands.
    pub fn is_open(&self) -> bool {
        !self.commands.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn channel() -> (
        CommandChannel,
        Arc<LineQueue>,
        mpsc::UnboundedReceiver<Outbound>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let lines = Arc::new(LineQueue::new());
        let channel = CommandChannel::new(tx, lines.clone(), Bytes::from_static(b"\r"));
        (channel, lines, rx)
    }

    #[tokio::test]
    async fn test_send_enqueues_with_terminator() {
        let (channel, _lines, mut rx) = channel();

        channel.send("enable", true).unwrap();
        channel.send("b", false).unwrap();
        channel.send_terminator().unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            Outbound::line("enable", Bytes::from_static(b"\r"))
        );
        assert_eq!(rx.recv().await.unwrap(), Outbound::raw("b"));
        assert_eq!(rx.recv().await.unwrap(), Outbound::raw("\r"));
    }

    #[test]
    fn test_send_after_writer_gone() {
        let (channel, _lines, rx) = channel();
        drop(rx);
        assert!(!channel.is_open());
        assert!(matches!(
            channel.send("enable", true),
            Err(Error::Channel(ChannelError::Closed))
        ));
    }

    #[tokio::test]
    async fn test_wait_for_case_insensitive_substring() {
        let (channel, lines, _rx) = channel();
        lines.push("init failed".into());
        lines.push("...Initialization Is Done...".into());

        let line = channel
            .wait_for(&Landmark::contains("initialization is done"), None)
            .await
            .unwrap();
        assert_eq!(line, "...Initialization Is Done...");
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_wait_for_exact() {
        let (channel, lines, _rx) = channel();
        lines.push("ready now".into());
        lines.push("READY".into());
        lines.push("ready".into());
        lines.push("after".into());

        let line = channel
            .wait_for(&Landmark::exact("ready"), None)
            .await
            .unwrap();
        assert_eq!(line, "ready");
        assert_eq!(lines.len(), 1);
    }

    #[tokio::test]
    async fn test_discard_then_wait_sees_fresh_line() {
        let (channel, lines, _rx) = channel();
        lines.push("stale".into());
        lines.push("also stale".into());

        assert_eq!(channel.discard_pending(), 2);
        lines.push("stale".into());

        let line = channel
            .wait_for(&Landmark::contains("stale"), Some(Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(line, "stale");
        assert!(lines.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_timeout_not_before_limit() {
        let (channel, lines, _rx) = channel();
        lines.push("noise".into());

        let start = tokio::time::Instant::now();
        let err = channel
            .wait_for(&Landmark::contains("'b' to stop at"), Some(Duration::from_secs(2)))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_wait_for_closed_queue() {
        let (channel, lines, _rx) = channel();
        lines.push("unrelated".into());
        lines.close();

        let err = channel
            .wait_for(&Landmark::contains("never"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Channel(ChannelError::Closed)));
    }

    #[test]
    fn test_read_line_non_blocking() {
        let (channel, lines, _rx) = channel();
        assert_eq!(channel.read_line().unwrap(), None);

        lines.push("unit 1".into());
        assert_eq!(channel.read_line().unwrap().as_deref(), Some("unit 1"));

        lines.close();
        assert!(channel.read_line().is_err());
    }

    #[tokio::test]
    async fn test_next_line() {
        let (channel, lines, _rx) = channel();
        lines.push("one".into());
        assert_eq!(channel.next_line(None).await.unwrap(), "one");

        let err = channel
            .next_line(Some(Duration::from_millis(10)))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}

//! Console session: transport lifecycle plus the controller primitives.

use std::time::Duration;

use bytes::Bytes;
use log::{debug, info, warn};

use crate::channel::{self, ChannelConfig, CommandChannel, Landmark, Workers};
use crate::error::{DriverError, Result};
use crate::transport::{SerialConfig, Transport};

/// Lifecycle of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport yet.
    Disconnected,
    /// Transport open, workers running.
    Connected,
    /// Transport released; the session cannot be used again.
    Closed,
}

struct Link {
    channel: CommandChannel,
    workers: Workers,
    name: String,
}

/// A console session with one device.
///
/// `connect` opens the serial port and starts a reader and a writer
/// worker; `close` stops both and releases the port. In between, the
/// session offers the send / wait / discard primitives sequences are
/// built from.
pub struct Session {
    serial: SerialConfig,
    config: ChannelConfig,
    state: SessionState,
    link: Option<Link>,
}

impl Session {
    /// Create a disconnected session.
    pub fn new(serial: SerialConfig, config: ChannelConfig) -> Self {
        Self {
            serial,
            config,
            state: SessionState::Disconnected,
            link: None,
        }
    }

    /// Open the configured serial port and start the workers.
    pub fn connect(&mut self) -> Result<()> {
        self.check_connectable()?;
        let transport = Transport::open(&self.serial)?;
        self.attach(transport)
    }

    /// Start the workers over an already-open transport.
    pub fn attach(&mut self, transport: Transport) -> Result<()> {
        self.check_connectable()?;

        let name = transport.name().to_string();
        let (channel, workers) = channel::spawn(transport, &self.config);
        self.link = Some(Link {
            channel,
            workers,
            name,
        });
        self.state = SessionState::Connected;
        info!("session: connected to {}", self.port_name());
        Ok(())
    }

    fn check_connectable(&self) -> Result<()> {
        match self.state {
            SessionState::Disconnected => Ok(()),
            SessionState::Connected => Err(DriverError::AlreadyConnected.into()),
            SessionState::Closed => Err(DriverError::SessionClosed.into()),
        }
    }

    /// Stop the workers and release the transport.
    ///
    /// Commands already queued are written before the port closes.
    pub async fn close(&mut self) -> Result<()> {
        self.state = SessionState::Closed;
        if let Some(link) = self.link.take() {
            if let Some(transport) = link.workers.shutdown().await {
                transport.close().await?;
            }
            info!("session: closed {}", link.name);
        }
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session is connected.
    pub fn is_open(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Name of the connected port, or the configured one.
    pub fn port_name(&self) -> &str {
        self.link
            .as_ref()
            .map(|l| l.name.as_str())
            .unwrap_or(&self.serial.port)
    }

    /// Channel configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Set the default wait bound. `None` waits forever.
    pub fn set_wait_timeout(&mut self, timeout: Option<Duration>) {
        self.config.wait_timeout = timeout;
    }

    /// The command channel, if connected.
    pub fn channel(&self) -> Result<&CommandChannel> {
        match self.state {
            SessionState::Connected => self
                .link
                .as_ref()
                .map(|l| &l.channel)
                .ok_or_else(|| DriverError::NotConnected.into()),
            SessionState::Disconnected => Err(DriverError::NotConnected.into()),
            SessionState::Closed => Err(DriverError::SessionClosed.into()),
        }
    }

    /// Send a command followed by the line terminator.
    pub fn send(&self, command: &str) -> Result<()> {
        self.channel()?.send(command, true)
    }

    /// Send text with no terminator.
    pub fn send_raw(&self, text: &str) -> Result<()> {
        self.channel()?.send(text, false)
    }

    /// Drop output not yet consumed.
    pub fn discard_pending(&self) -> Result<usize> {
        Ok(self.channel()?.discard_pending())
    }

    /// Next queued line without waiting.
    pub fn read_line(&self) -> Result<Option<String>> {
        self.channel()?.read_line()
    }

    /// Wait for a matching line using the session's default bound.
    pub async fn wait_for(&self, landmark: impl Into<Landmark>) -> Result<String> {
        self.wait_for_within(landmark, self.config.wait_timeout).await
    }

    /// Wait for a matching line with an explicit bound.
    pub async fn wait_for_within(
        &self,
        landmark: impl Into<Landmark>,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let landmark = landmark.into();
        self.channel()?.wait_for(&landmark, timeout).await
    }

    /// Wait for a line exactly equal to `line`.
    pub async fn wait_for_exact(&self, line: &str) -> Result<String> {
        self.wait_for(Landmark::exact(line)).await
    }

    /// Discard stale output, then wait for `landmark`.
    pub async fn expect(&self, landmark: impl Into<Landmark>) -> Result<String> {
        self.discard_pending()?;
        self.wait_for(landmark).await
    }

    /// Discard stale output, send `command`, then wait for `landmark`.
    ///
    /// Discarding before the send means a fast reply cannot be thrown away
    /// as stale.
    pub async fn send_and_expect(
        &self,
        command: &str,
        landmark: impl Into<Landmark>,
    ) -> Result<String> {
        self.discard_pending()?;
        self.send(command)?;
        self.wait_for(landmark).await
    }

    async fn keystroke(&self, label: &str, bytes: Bytes, repeat: usize) -> Result<()> {
        let channel = self.channel()?;
        for i in 0..repeat {
            debug!("session: {}", label);
            channel.send_bytes(bytes.clone())?;
            if repeat > 1 && i + 1 < repeat {
                tokio::time::sleep(self.config.keystroke_delay).await;
            }
        }
        Ok(())
    }

    /// Send the line terminator `repeat` times.
    pub async fn enter(&self, repeat: usize) -> Result<()> {
        self.keystroke("<Enter>", self.config.terminator.clone(), repeat)
            .await
    }

    /// Send a space `repeat` times (pages through `--More--`).
    pub async fn space(&self, repeat: usize) -> Result<()> {
        self.keystroke("<Space>", Bytes::from_static(b" "), repeat).await
    }

    /// Send a tab `repeat` times.
    pub async fn tab(&self, repeat: usize) -> Result<()> {
        self.keystroke("<Tab>", Bytes::from_static(b"\t"), repeat).await
    }

    /// Send Ctrl-C `repeat` times.
    pub async fn ctrl_c(&self, repeat: usize) -> Result<()> {
        self.keystroke("<Control-C>", Bytes::from_static(b"\x03"), repeat).await
    }

    /// Send `command` and then each confirmation keystroke bare.
    pub fn send_confirmed(&self, command: &str, confirmations: &[String]) -> Result<()> {
        self.send(command)?;
        for answer in confirmations {
            self.send_raw(answer)?;
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(link) = &self.link {
            warn!(
                "session: {} dropped without close(); stopping workers",
                link.name
            );
            link.workers.signal_stop();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("port", &self.port_name())
            .field("state", &self.state)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

    use super::*;
    use crate::error::{ChannelError, Error};

    fn attached() -> (Session, DuplexStream) {
        let (local, peer) = tokio::io::duplex(4096);
        let mut session = Session::new(SerialConfig::default(), ChannelConfig::default());
        session
            .attach(Transport::from_stream("pipe", local))
            .unwrap();
        (session, peer)
    }

    async fn read_exactly(peer: &mut DuplexStream, len: usize) -> Vec<u8> {
        let mut received = Vec::new();
        let mut buf = [0u8; 256];
        while received.len() < len {
            let n = peer.read(&mut buf).await.unwrap();
            assert!(n > 0, "peer hung up");
            received.extend_from_slice(&buf[..n]);
        }
        received
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let (mut session, _peer) = attached();
        assert_eq!(session.state(), SessionState::Connected);
        assert!(session.is_open());
        assert_eq!(session.port_name(), "pipe");

        assert!(matches!(
            session.attach(Transport::from_stream("again", tokio::io::duplex(8).0)),
            Err(Error::Driver(DriverError::AlreadyConnected))
        ));

        session.close().await.unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(
            session.send("enable"),
            Err(Error::Driver(DriverError::SessionClosed))
        ));
        assert!(matches!(
            session.connect(),
            Err(Error::Driver(DriverError::SessionClosed))
        ));

        // Closing twice is harmless.
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_disconnected_session_rejects_commands() {
        let session = Session::new(SerialConfig::default(), ChannelConfig::default());
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(matches!(
            session.send("enable"),
            Err(Error::Driver(DriverError::NotConnected))
        ));
        assert!(session.read_line().is_err());
    }

    #[tokio::test]
    async fn test_connect_failure_stays_disconnected() {
        let mut session = Session::new(
            SerialConfig::new("/dev/ferrocon-does-not-exist", 9600),
            ChannelConfig::default(),
        );
        assert!(session.connect().is_err());
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_keystrokes() {
        let (session, mut peer) = attached();

        session.enter(2).await.unwrap();
        session.space(1).await.unwrap();
        session.tab(1).await.unwrap();
        session.ctrl_c(1).await.unwrap();
        session.send_raw("b").unwrap();

        assert_eq!(read_exactly(&mut peer, 6).await, b"\r\r \t\x03b");
    }

    #[tokio::test]
    async fn test_enter_uses_configured_terminator() {
        let (local, mut peer) = tokio::io::duplex(4096);
        let config = ChannelConfig {
            terminator: Bytes::from_static(b"\r\n"),
            ..Default::default()
        };
        let mut session = Session::new(SerialConfig::default(), config);
        session
            .attach(Transport::from_stream("pipe", local))
            .unwrap();

        session.enter(2).await.unwrap();
        session.send("show version").unwrap();

        assert_eq!(
            read_exactly(&mut peer, 18).await,
            b"\r\n\r\nshow version\r\n"
        );
    }

    #[tokio::test]
    async fn test_send_confirmed() {
        let (session, mut peer) = attached();

        session
            .send_confirmed("reload", &["y".to_string(), "y".to_string()])
            .unwrap();

        assert_eq!(read_exactly(&mut peer, 9).await, b"reload\ryy");
    }

    #[tokio::test]
    async fn test_send_and_expect() {
        let (session, mut peer) = attached();

        peer.write_all(b"stale TFTP to Flash Done\r\n").await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let responder = tokio::spawn(async move {
            let cmd = read_exactly(&mut peer, b"copy tftp flash x\r".len()).await;
            assert_eq!(cmd, b"copy tftp flash x\r");
            peer.write_all(b"TFTP to Flash Done.\r\n").await.unwrap();
            peer
        });

        let line = session
            .send_and_expect("copy tftp flash x", "tftp to flash done")
            .await
            .unwrap();
        assert_eq!(line, "TFTP to Flash Done.");
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_for_exact_and_bounded() {
        let (mut session, mut peer) = attached();
        session.set_wait_timeout(Some(Duration::from_millis(300)));

        peer.write_all(b"ready?\r\nready\r\n").await.unwrap();
        assert_eq!(session.wait_for_exact("ready").await.unwrap(), "ready");

        let err = session.wait_for("never").await.unwrap_err();
        assert!(matches!(err, Error::Channel(ChannelError::Timeout(_))));
    }
}

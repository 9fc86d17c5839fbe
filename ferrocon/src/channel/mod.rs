//! Channel layer: line assembly, the two session workers, and the
//! command/response façade the controller talks to.
//!
//! ```text
//! controller ──send──► CommandChannel ──mpsc──► LineWriter ──► transport
//! controller ◄─wait─── CommandChannel ◄─LineQueue── LineReader ◄── transport
//! ```

mod buffer;
mod command;
mod landmark;
mod queue;
mod reader;
mod writer;

pub use buffer::LineBuffer;
pub use command::{ChannelConfig, CommandChannel};
pub use landmark::Landmark;
pub use queue::LineQueue;
pub use reader::LineReader;
pub use writer::{LineWriter, Outbound};

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::transport::{Transport, TransportReader, TransportWriter};

/// Handles to a running reader/writer pair.
#[derive(Debug)]
pub struct Workers {
    stop: watch::Sender<bool>,
    reader: JoinHandle<TransportReader>,
    writer: JoinHandle<TransportWriter>,
}

/// Split `transport` and start the reader and writer workers.
///
/// Must be called from within a tokio runtime.
pub fn spawn(transport: Transport, config: &ChannelConfig) -> (CommandChannel, Workers) {
    let (transport_reader, transport_writer) = transport.into_split();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = watch::channel(false);
    let lines = Arc::new(LineQueue::new());

    let reader = LineReader::new(
        transport_reader,
        lines.clone(),
        config.read_timeout,
        config.partial_flush,
    );
    let writer = LineWriter::new(transport_writer, command_rx);

    let workers = Workers {
        stop: stop_tx,
        reader: tokio::spawn(reader.run(stop_rx.clone())),
        writer: tokio::spawn(writer.run(stop_rx)),
    };
    let channel = CommandChannel::new(command_tx, lines, config.terminator.clone());

    (channel, workers)
}

impl Workers {
    /// Ask both workers to stop without waiting for them.
    pub fn signal_stop(&self) {
        // Both receivers may already be gone; nothing to do then.
        let _ = self.stop.send(true);
    }

    /// Stop both workers, wait for them, and reassemble the transport.
    ///
    /// Returns `None` if either worker panicked.
    pub async fn shutdown(self) -> Option<Transport> {
        self.signal_stop();

        let writer = self.writer.await;
        let reader = self.reader.await;

        match (reader, writer) {
            (Ok(reader), Ok(writer)) => {
                debug!("channel: workers stopped");
                Some(Transport::reunite(reader, writer))
            }
            (reader, writer) => {
                if let Err(e) = reader {
                    warn!("channel: reader worker failed: {}", e);
                }
                if let Err(e) = writer {
                    warn!("channel: writer worker failed: {}", e);
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    #[tokio::test]
    async fn test_round_trip_through_workers() {
        let (local, mut peer) = tokio::io::duplex(1024);
        let (channel, workers) = spawn(
            Transport::from_stream("pipe", local),
            &ChannelConfig::default(),
        );

        channel.send("show version", true).unwrap();
        let mut buf = [0u8; 64];
        let mut received = Vec::new();
        while received.len() < b"show version\r".len() {
            let n = peer.read(&mut buf).await.unwrap();
            received.extend_from_slice(&buf[..n]);
        }
        assert_eq!(received, b"show version\r");

        peer.write_all(b"SW: Version 08.0.95\r\n").await.unwrap();
        let line = channel
            .wait_for(&Landmark::contains("version"), Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(line, "SW: Version 08.0.95");

        let transport = workers.shutdown().await.unwrap();
        assert_eq!(transport.name(), "pipe");
        transport.close().await.unwrap();

        assert!(!channel.is_open());
        assert!(channel.read_line().is_err());
    }

    #[tokio::test]
    async fn test_workers_debug() {
        let (local, _peer) = tokio::io::duplex(1024);
        let (_channel, workers) = spawn(
            Transport::from_stream("pipe", local),
            &ChannelConfig::default(),
        );
        assert!(format!("{:?}", workers).starts_with("Workers"));

        let (reader, writer) = workers.shutdown().await.unwrap().into_split();
        assert_eq!(format!("{:?}", reader), r#"TransportReader { name: "pipe" }"#);
        assert_eq!(format!("{:?}", writer), "TransportWriter { .. }");
    }

    #[tokio::test]
    async fn test_shutdown_flushes_queued_commands() {
        let (local, mut peer) = tokio::io::duplex(1024);
        let (channel, workers) = spawn(
            Transport::from_stream("pipe", local),
            &ChannelConfig::default(),
        );

        channel.send("reload", true).unwrap();
        channel.send("y", false).unwrap();
        channel.send("y", false).unwrap();

        let transport = workers.shutdown().await.unwrap();
        transport.close().await.unwrap();

        let mut received = Vec::new();
        peer.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"reload\ryy");
    }
}

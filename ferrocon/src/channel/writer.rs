//! Background worker dispatching queued commands to the transport.

use bytes::Bytes;
use log::{debug, trace, warn};
use tokio::sync::{mpsc, watch};

use crate::error::Result;
use crate::transport::TransportWriter;

/// One entry on the command queue.
///
/// The terminator travels with its payload so that concurrent enqueues
/// can never slip another payload between the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    /// Raw bytes to write.
    pub payload: Bytes,

    /// Written straight after the payload, if present.
    pub terminator: Option<Bytes>,
}

impl Outbound {
    /// A payload followed by a terminator.
    pub fn line(payload: impl Into<Bytes>, terminator: Bytes) -> Self {
        Self {
            payload: payload.into(),
            terminator: Some(terminator),
        }
    }

    /// A bare payload (keystrokes, confirmations).
    pub fn raw(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            terminator: None,
        }
    }
}

/// Writes queued [`Outbound`] entries to the transport in enqueue order.
pub struct LineWriter {
    transport: TransportWriter,
    commands: mpsc::UnboundedReceiver<Outbound>,
}

impl LineWriter {
    /// Create a writer consuming `commands`.
    pub fn new(transport: TransportWriter, commands: mpsc::UnboundedReceiver<Outbound>) -> Self {
        Self {
            transport,
            commands,
        }
    }

    async fn dispatch(&mut self, outbound: &Outbound) -> Result<()> {
        self.transport.write(&outbound.payload).await?;
        if let Some(terminator) = &outbound.terminator {
            self.transport.write(terminator).await?;
        }
        self.transport.flush().await
    }

    async fn write_logged(&mut self, outbound: Outbound) {
        trace!("writer: {:?}", outbound.payload);
        if let Err(e) = self.dispatch(&outbound).await {
            warn!("writer: dropped {:?}: {}", outbound.payload, e);
        }
    }

    /// Run until `stop` flips to true or every sender is gone.
    ///
    /// Commands already queued when the stop arrives are still written.
    /// Returns the transport half so the session can close the stream.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> TransportWriter {
        debug!("writer: started");

        loop {
            tokio::select! {
                biased;

                next = self.commands.recv() => match next {
                    Some(outbound) => self.write_logged(outbound).await,
                    None => break,
                },
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }

        while let Ok(outbound) = self.commands.try_recv() {
            self.write_logged(outbound).await;
        }

        debug!("writer: stopped");
        self.transport
    }
}

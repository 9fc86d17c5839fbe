//! Serial transport implementation using tokio-serial.

use std::pin::Pin;

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio_serial::SerialPortBuilderExt;

use super::config::SerialConfig;
use crate::error::{Result, TransportError};

/// Any duplex byte stream a console can be reached through.
///
/// Serial ports are the usual case, but a TCP terminal server or an
/// in-memory pipe works just as well.
pub trait ConsoleStream: AsyncRead + AsyncWrite + Send {}

impl<T: AsyncRead + AsyncWrite + Send + ?Sized> ConsoleStream for T {}

type BoxedStream = Pin<Box<dyn ConsoleStream>>;

/// An open console byte stream.
pub struct Transport {
    /// The underlying stream.
    stream: BoxedStream,

    /// Port name or other label used in logs.
    name: String,
}

impl Transport {
    /// Open the serial port described by `config`.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = tokio_serial::new(config.port.as_str(), config.baud_rate)
            .data_bits(config.data_bits)
            .parity(config.parity)
            .stop_bits(config.stop_bits)
            .flow_control(config.flow_control)
            .open_native_async()
            .map_err(|source| TransportError::OpenFailed {
                port: config.port.clone(),
                source,
            })?;

        debug!(
            "transport: opened {} at {} baud",
            config.port, config.baud_rate
        );

        Ok(Self::from_stream(config.port.clone(), port))
    }

    /// Wrap an already-open stream.
    pub fn from_stream<S>(name: impl Into<String>, stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self {
            stream: Box::pin(stream),
            name: name.into(),
        }
    }

    /// List the serial ports present on this machine.
    pub fn available_ports() -> Result<Vec<String>> {
        let ports = tokio_serial::available_ports().map_err(TransportError::Enumerate)?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }

    /// Port name or label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Split into independently owned read and write halves.
    pub fn into_split(self) -> (TransportReader, TransportWriter) {
        let (reader, writer) = tokio::io::split(self.stream);
        (
            TransportReader {
                inner: reader,
                name: self.name,
            },
            TransportWriter { inner: writer },
        )
    }

    /// Put the halves from [`into_split`](Self::into_split) back together.
    pub fn reunite(reader: TransportReader, writer: TransportWriter) -> Self {
        let name = reader.name.clone();
        Self {
            stream: reader.inner.unsplit(writer.inner),
            name,
        }
    }

    /// Shut the stream down.
    pub async fn close(mut self) -> Result<()> {
        self.stream.shutdown().await.map_err(TransportError::Io)?;
        debug!("transport: closed {}", self.name);
        Ok(())
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").field("name", &self.name).finish()
    }
}

/// Read half of a [`Transport`].
pub struct TransportReader {
    inner: ReadHalf<BoxedStream>,
    name: String,
}

impl TransportReader {
    /// Read whatever bytes are available into `buf`.
    ///
    /// Cancel safe: if the future is dropped before completion no data
    /// has been consumed. End of stream is reported as
    /// [`TransportError::Disconnected`].
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.inner.read(buf).await.map_err(TransportError::Io)?;
        if n == 0 {
            return Err(TransportError::Disconnected.into());
        }
        Ok(n)
    }

    /// Port name or label.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for TransportReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportReader")
            .field("name", &self.name)
            .finish()
    }
}

/// Write half of a [`Transport`].
pub struct TransportWriter {
    inner: WriteHalf<BoxedStream>,
}

impl TransportWriter {
    /// Write all of `bytes`.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner
            .write_all(bytes)
            .await
            .map_err(TransportError::Io)?;
        Ok(())
    }

    /// Flush buffered output to the device.
    pub async fn flush(&mut self) -> Result<()> {
        self.inner.flush().await.map_err(TransportError::Io)?;
        Ok(())
    }
}

impl std::fmt::Debug for TransportWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportWriter").finish_non_exhaustive()
    }
}

//! Serial transport layer wrapping tokio-serial.
//!
//! This module owns the raw byte stream to the device console: opening
//! the port, splitting it into read and write halves for the session
//! workers, and shutting it down again.

pub mod config;
mod serial;

pub use config::SerialConfig;
pub use serial::{ConsoleStream, Transport, TransportReader, TransportWriter};

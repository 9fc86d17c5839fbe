//! Error types for ferrocon.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for ferrocon operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Serial transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Command channel errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session and sequence errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Model profile and firmware descriptor errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl Error {
    /// Whether this error is an elapsed bounded wait.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Channel(ChannelError::Timeout(_)))
    }
}

/// Transport layer errors (port open, raw I/O).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to open the serial port
    #[error("Failed to open serial port {port}: {source}")]
    OpenFailed {
        port: String,
        #[source]
        source: tokio_serial::Error,
    },

    /// Port enumeration failed
    #[error("Failed to enumerate serial ports: {0}")]
    Enumerate(#[source] tokio_serial::Error),

    /// The other end closed the stream
    #[error("Connection disconnected")]
    Disconnected,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Command channel errors (waiting, queueing).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// A bounded wait elapsed without a matching line
    #[error("Landmark not seen within {0:?}")]
    Timeout(Duration),

    /// The workers are gone and no more lines will arrive
    #[error("Channel closed")]
    Closed,

    /// Invalid regex landmark
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Driver layer errors (session lifecycle, sequences).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Session not connected
    #[error("Session not connected - call connect() first")]
    NotConnected,

    /// Session already connected
    #[error("Session already connected")]
    AlreadyConnected,

    /// Session was closed and cannot be reused
    #[error("Session closed")]
    SessionClosed,

    /// The wipe loop kept finding a stack member
    #[error("Wipe did not converge after {attempts} boot attempts")]
    WipeNotConverged { attempts: u32 },

    /// Invalid configuration in the switch builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Model profile and firmware descriptor errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No built-in or registered profile for this model
    #[error("Unknown model: '{name}'")]
    UnknownModel { name: String },

    /// A profile with this name is already registered
    #[error("Model already registered: '{name}'")]
    AlreadyRegistered { name: String },

    /// The firmware descriptor could not be read
    #[error("Failed to read firmware descriptor {path}: {source}")]
    DescriptorRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The firmware descriptor has no row for this model
    #[error("Model '{model}' not found in firmware descriptor")]
    ModelNotFound { model: String },
}

/// Result type alias using ferrocon's Error.
pub type Result<T> = std::result::Result<T, Error>;

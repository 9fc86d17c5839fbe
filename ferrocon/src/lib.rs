//! # Ferrocon
//!
//! Async serial console automation for network switch provisioning.
//!
//! Ferrocon drives a switch's console the way an operator at a terminal
//! would: it sends commands, waits for landmarks in the output and walks
//! multi-step sequences that put a factory or second-hand unit into a
//! known state.
//!
//! ## Features
//!
//! - Serial ports via tokio-serial, or any async byte stream
//! - Background reader and writer workers per session
//! - Case-insensitive, exact and regex landmarks with optional timeouts
//! - Boot-interrupt, wipe (with stack member recovery) and firmware upload
//! - FastIron model profiles and flat-file firmware descriptors
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferrocon::SwitchBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ferrocon::Error> {
//!     let mut switch = SwitchBuilder::new("/dev/ttyUSB0")
//!         .model("ICX7150")
//!         .descriptor_path("codes.txt")
//!         .build()?;
//!
//!     switch.connect()?;
//!
//!     let wiped = switch.wipe().await?;
//!     println!("{}", wiped);
//!
//!     let uploaded = switch.upload().await?;
//!     println!("{}", uploaded);
//!
//!     switch.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod platform;
pub mod transport;

// Re-export main types for convenience
pub use channel::{ChannelConfig, Landmark};
pub use driver::{
    ScriptBuilder, ScriptResult, ScriptStep, Session, SessionState, Switch, SwitchBuilder,
    UploadReport, WipeReport, WipeState,
};
pub use error::{Error, Result};
pub use platform::{DeviceConfig, DeviceProfile, FirmwareDescriptor, ModelRegistry};
pub use transport::{SerialConfig, Transport};

//! Platform definitions: per-model profiles and firmware descriptors.
//!
//! A profile holds the console dialogue for a switch family plus the
//! model-specific bits (descriptor row, PoE step). Firmware filenames come
//! from a separate descriptor file resolved once per switch.

mod definition;
mod firmware;
mod registry;
pub mod vendors;

pub use definition::{CommandSet, DeviceProfile, ImageKind, ProvisioningNetwork};
pub use firmware::{DeviceConfig, FirmwareDescriptor};
pub use registry::ModelRegistry;

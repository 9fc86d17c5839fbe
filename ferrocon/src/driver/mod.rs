//! High-level driver for switch provisioning.
//!
//! The driver layer provides the main API: a [`Session`] with the
//! send/wait primitives, and a [`Switch`] running the boot-interrupt,
//! wipe and upload sequences on top of it.

mod builder;
mod report;
mod script;
mod session;
mod switch;

pub use builder::SwitchBuilder;
pub use report::{Transfer, UploadReport, WipeReport};
pub use script::{PendingStep, ScriptBuilder, ScriptResult, ScriptStep, StepOutcome};
pub use session::{Session, SessionState};
pub use switch::{Switch, WipeState};

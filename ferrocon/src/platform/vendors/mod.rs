//! Built-in vendor profiles.

pub mod brocade;

//! Application core boundary: commands in, status and transitions out.
//!
//! The door logic itself lives in [`crate::fsm`]; this module defines the
//! **port traits** in [`ports`] that keep it testable without real
//! peripherals, plus the command and status types adapters exchange with it.

pub mod commands;
pub mod events;
pub mod observers;
pub mod ports;

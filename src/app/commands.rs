//! Inbound commands to the door state machine.
//!
//! These represent actions requested by the outside world (console,
//! request layer, automation hub) that the
//! [`DoorStateMachine`](crate::fsm::DoorStateMachine) interprets and acts upon.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::fsm::states::DoorState;

/// Commands that external adapters can send into the door core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorCommand {
    /// Pulse the open line and monitor travel toward `Open`.
    Open,
    /// Pulse the close line and monitor travel toward `Closed`.
    Close,
}

impl DoorCommand {
    /// Transient state entered when the command is accepted.
    pub fn moving_state(self) -> DoorState {
        match self {
            Self::Open => DoorState::Opening,
            Self::Close => DoorState::Closing,
        }
    }

    /// Terminal state the motion monitor commits when travel ends.
    pub fn target_state(self) -> DoorState {
        match self {
            Self::Open => DoorState::Open,
            Self::Close => DoorState::Closed,
        }
    }
}

/// Error returned when a string is not a known door action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownCommand;

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown door action (expected \"open\" or \"close\")")
    }
}

impl FromStr for DoorCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("open") {
            Ok(Self::Open)
        } else if s.eq_ignore_ascii_case("close") {
            Ok(Self::Close)
        } else {
            Err(UnknownCommand)
        }
    }
}

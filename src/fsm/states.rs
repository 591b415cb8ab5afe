//! Door state identity.
//!
//! Under normal operation the door cycles
//! `Closed -> Opening -> Open -> Closing -> Closed`.  A close command while
//! `Opening` jumps straight to `Closing` (and vice versa); the machine has
//! no terminal state.

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum DoorState {
    #[default]
    Closed = 0,
    Open = 1,
    Opening = 2,
    Closing = 3,
}

impl DoorState {
    /// True while an actuation is in progress.
    pub fn is_moving(self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::Opening => "OPENING",
            Self::Closing => "CLOSING",
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//! Port traits: the hexagonal boundary between the door core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DoorStateMachine (domain)
//! ```
//!
//! Driven adapters (relay lines, current sensor, notification layer)
//! implement these traits.  The [`DoorStateMachine`](crate::fsm::DoorStateMachine)
//! consumes them via generics, so the domain core never touches hardware
//! directly.

use core::time::Duration;

use crate::error::{ActuatorError, SensorError};
use crate::fsm::states::DoorState;

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// One of the two relay coil outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActuatorLine {
    /// Latches the relay toward "door open".
    Open,
    /// Latches the relay toward "door closed".
    Close,
}

impl ActuatorLine {
    pub fn other(self) -> Self {
        match self {
            Self::Open => Self::Close,
            Self::Close => Self::Open,
        }
    }
}

/// Steady output level of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Write-side port: the domain calls this to move the door.
///
/// Implementations must never leave both lines asserted.
pub trait ActuatorPort {
    /// Force both lines low, assert `line` for `duration`, then deassert.
    /// Blocks the caller for the pulse width.
    fn pulse(&mut self, line: ActuatorLine, duration: Duration) -> Result<(), ActuatorError>;

    /// Drive `line` to a steady level.
    fn set_level(&mut self, line: ActuatorLine, level: Level) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the motion monitor samples actuator current through this.
pub trait CurrentSensorPort {
    /// Instantaneous actuator current in amperes.
    fn read_current(&mut self) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// State listener port (driven adapter: domain → notification layer)
// ───────────────────────────────────────────────────────────────

/// Observer of door state transitions.
///
/// Invoked on a thread that committed a transition, in commit order; a
/// transition committed while another thread is delivering is handed to
/// listeners by that thread.  Implementations must return quickly and must
/// not issue door commands from inside the callback on the command thread.
pub trait StateListener: Send + Sync {
    fn on_state_change(&self, from: DoorState, to: DoorState);
}

impl<F> StateListener for F
where
    F: Fn(DoorState, DoorState) + Send + Sync,
{
    fn on_state_change(&self, from: DoorState, to: DoorState) {
        self(from, to);
    }
}

//! Log-based state listener adapter.
//!
//! Implements [`StateListener`] by writing every door transition to the
//! ESP-IDF logger (which goes to UART / USB-CDC in production).  A push
//! notification adapter would implement the same trait.

use log::info;

use crate::app::events::DoorStatus;
use crate::app::ports::StateListener;
use crate::fsm::states::DoorState;

/// Adapter that logs every transition to the serial console.
#[derive(Debug, Default)]
pub struct LogStateListener;

impl LogStateListener {
    pub fn new() -> Self {
        Self
    }
}

impl StateListener for LogStateListener {
    fn on_state_change(&self, from: DoorState, to: DoorState) {
        info!("STATE | {} -> {} | {}", from, to, DoorStatus::new(to).to_json());
    }
}

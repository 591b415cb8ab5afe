//! Outbound state snapshots.
//!
//! The notification layer serialises a [`DoorStatus`] for every transition
//! it learns about through a [`StateListener`](super::ports::StateListener);
//! the request layer returns the same shape for state queries.

use serde::Serialize;

use crate::fsm::states::DoorState;

/// Name reported for the single door this controller drives.
pub const DOOR_NAME: &str = "door";

/// Point-in-time door status, serialised as `{"name":"door","state":"OPEN"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DoorStatus {
    pub name: &'static str,
    pub state: DoorState,
}

impl DoorStatus {
    pub fn new(state: DoorState) -> Self {
        Self {
            name: DOOR_NAME,
            state,
        }
    }

    /// JSON body for subscribers and state queries.
    pub fn to_json(&self) -> String {
        // Serialising two plain fields cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

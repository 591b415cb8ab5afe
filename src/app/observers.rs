//! Fixed-capacity registry of door state listeners.
//!
//! Listeners are owned by the notification layer; the registry only holds
//! shared handles.  [`ObserverSet::notify`] snapshots the registry and
//! invokes every listener with no lock held, so a listener may subscribe,
//! unsubscribe or query the door state from inside its callback.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use heapless::Vec;

use super::ports::StateListener;
use crate::error::{Error, Result};
use crate::fsm::states::DoorState;

/// Maximum number of concurrently registered listeners.
pub const MAX_LISTENERS: usize = 8;

/// Handle returned by [`ObserverSet::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

type Entry = (ListenerId, Arc<dyn StateListener>);

pub struct ObserverSet {
    entries: RwLock<Vec<Entry, MAX_LISTENERS>>,
    next_id: AtomicU32,
}

impl Default for ObserverSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ObserverSet {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU32::new(1),
        }
    }

    pub fn subscribe(&self, listener: Arc<dyn StateListener>) -> Result<ListenerId> {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries
            .push((id, listener))
            .map_err(|_| Error::ListenersFull)?;
        Ok(id)
    }

    /// Returns `false` if `id` was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.iter().position(|(entry_id, _)| *entry_id == id) {
            Some(idx) => {
                // Preserve registration order for delivery.
                entries.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `(from, to)` to every listener in registration order.
    pub fn notify(&self, from: DoorState, to: DoorState) {
        let snapshot: Vec<Arc<dyn StateListener>, MAX_LISTENERS> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in &snapshot {
            listener.on_state_change(from, to);
        }
    }
}

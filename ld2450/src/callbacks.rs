//! Observer registry
//!
//! Observers are called synchronously on the notification path, outside the
//! registry lock, so an observer may register or unregister others (itself
//! included). They must not block.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::trace;

use ld2450_types::{DeviceConfig, TargetState};

/// What changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent<'a> {
    Targets(&'a TargetState),
    Config(&'a DeviceConfig),
}

pub type StateCallback = Arc<dyn Fn(StateEvent<'_>) + Send + Sync>;
pub type DisconnectedCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    State,
    Disconnected,
}

#[derive(Default)]
pub(crate) struct CallbackRegistry {
    next_id: AtomicU64,
    state: RwLock<Vec<(u64, StateCallback)>>,
    disconnected: RwLock<Vec<(u64, DisconnectedCallback)>>,
}

impl CallbackRegistry {
    pub(crate) fn register_state(self: &Arc<Self>, callback: StateCallback) -> CallbackHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.state.write().push((id, callback));
        self.handle(id, CallbackKind::State)
    }

    pub(crate) fn register_disconnected(self: &Arc<Self>, callback: DisconnectedCallback) -> CallbackHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.disconnected.write().push((id, callback));
        self.handle(id, CallbackKind::Disconnected)
    }

    fn handle(self: &Arc<Self>, id: u64, kind: CallbackKind) -> CallbackHandle {
        CallbackHandle {
            registry: Arc::downgrade(self),
            id,
            kind,
        }
    }

    fn remove(&self, id: u64, kind: CallbackKind) -> bool {
        match kind {
            CallbackKind::State => remove_entry(&mut self.state.write(), id),
            CallbackKind::Disconnected => remove_entry(&mut self.disconnected.write(), id),
        }
    }

    /// Fan a telemetry update out to every state observer
    pub(crate) fn notify_state(&self, targets: &TargetState, config: &DeviceConfig) {
        let observers: Vec<StateCallback> = self.state.read().iter().map(|(_, cb)| Arc::clone(cb)).collect();
        trace!("Notifying {} state observers", observers.len());

        for observer in observers {
            observer(StateEvent::Targets(targets));
            observer(StateEvent::Config(config));
        }
    }

    pub(crate) fn notify_disconnected(&self) {
        let observers: Vec<DisconnectedCallback> =
            self.disconnected.read().iter().map(|(_, cb)| Arc::clone(cb)).collect();

        for observer in observers {
            observer();
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self, kind: CallbackKind) -> usize {
        match kind {
            CallbackKind::State => self.state.read().len(),
            CallbackKind::Disconnected => self.disconnected.read().len(),
        }
    }
}

fn remove_entry<T>(entries: &mut Vec<(u64, T)>, id: u64) -> bool {
    let before = entries.len();
    entries.retain(|(entry_id, _)| *entry_id != id);
    entries.len() != before
}

/// Registration receipt; the only way to remove an observer
pub struct CallbackHandle {
    registry: Weak<CallbackRegistry>,
    id: u64,
    kind: CallbackKind,
}

impl CallbackHandle {
    pub fn kind(&self) -> CallbackKind {
        self.kind
    }

    /// Remove the observer
    ///
    /// Returns false if the device is gone.
    pub fn unregister(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(self.id, self.kind),
            None => false,
        }
    }
}

impl fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

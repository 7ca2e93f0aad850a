//! State publishing: the sink the sequencer writes to
//!
//! `StatePublisher` is the narrow seam to the host's property bus.
//! `PropertyBus` is the in-process implementation: four atomics holding the
//! current value of each identify property, plus a broadcast channel that
//! fans every write out to live observers.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::types::{ObservableState, PropertyChange, StateKey};

/// Capacity of the change broadcast; slow subscribers lag past this
pub const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Sink for observable identify state
///
/// Writes are fire-and-forget: implementations must not block and cannot fail.
pub trait StatePublisher: Send + Sync {
    fn publish(&self, key: StateKey, value: i32);
}

/// In-process property bus
#[derive(Debug)]
pub struct PropertyBus {
    values: [AtomicI32; 4],
    registered: [AtomicBool; 4],
    changes: broadcast::Sender<PropertyChange>,
}

impl Default for PropertyBus {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyBus {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            values: Default::default(),
            registered: Default::default(),
            changes,
        }
    }

    /// Register a property with its initial value
    ///
    /// Registering again resets the value without notifying observers.
    pub fn add_property(&self, key: StateKey, initial: i32) {
        self.values[slot(key)].store(initial, Ordering::SeqCst);
        if !self.registered[slot(key)].swap(true, Ordering::SeqCst) {
            debug!(property = key.as_str(), initial, "registered property");
        }
    }

    pub fn is_registered(&self, key: StateKey) -> bool {
        self.registered[slot(key)].load(Ordering::SeqCst)
    }

    /// Current value of one property
    pub fn get(&self, key: StateKey) -> i32 {
        self.values[slot(key)].load(Ordering::SeqCst)
    }

    /// Current value of every property
    ///
    /// Fields are read one at a time, so a snapshot taken mid-run may mix
    /// values from two adjacent writes.
    pub fn snapshot(&self) -> ObservableState {
        ObservableState {
            pulse_level: self.get(StateKey::IdentifyPulse),
            target_id: self.get(StateKey::IdentifyTargetId),
            channel: self.get(StateKey::IdentifyChannel),
            mode: self.get(StateKey::IdentifyMode),
        }
    }

    /// Live feed of every subsequent write
    pub fn subscribe(&self) -> broadcast::Receiver<PropertyChange> {
        self.changes.subscribe()
    }
}

impl StatePublisher for PropertyBus {
    fn publish(&self, key: StateKey, value: i32) {
        if !self.is_registered(key) {
            debug!(property = key.as_str(), value, "publish to unregistered property");
        }
        self.values[slot(key)].store(value, Ordering::SeqCst);
        trace!(property = key.as_str(), value, "publish");
        // No subscribers is fine
        let _ = self.changes.send(PropertyChange::new(key, value));
    }
}

fn slot(key: StateKey) -> usize {
    match key {
        StateKey::IdentifyPulse => 0,
        StateKey::IdentifyTargetId => 1,
        StateKey::IdentifyChannel => 2,
        StateKey::IdentifyMode => 3,
    }
}

// =============================================================================
// TESTS
// =============================================================================

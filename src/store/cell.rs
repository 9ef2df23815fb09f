//! Replay-capable value cell.
//!
//! A cell holds the current JSON value for one key plus an ordered list of
//! listeners. Listeners run synchronously, in subscription order, and never
//! while a cell lock is held, so they are free to call back into the store.
//!
//! Every cell of a store shares that store's [`Gate`]. Publishing and
//! subscribing hold it for the whole update-and-notify step, so concurrent
//! writers are serialized and each listener sees values in publish order.

use parking_lot::{Mutex, ReentrantMutex};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Callback invoked with every value the cell publishes.
pub(crate) type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Store-wide lock held across a backend write and the notifications it
/// causes. Reentrant so listeners can write back on the same thread.
pub(crate) type Gate = Arc<ReentrantMutex<()>>;

/// Serialized form of the unset value.
pub(crate) const NULL_RAW: &str = "null";

struct Entry {
    id: u64,
    active: Arc<AtomicBool>,
    listener: Listener,
}

/// Current value together with its serialized form, compared on publish.
struct Current {
    value: Value,
    raw: String,
}

pub(crate) struct Cell {
    key: String,
    gate: Gate,
    current: Mutex<Current>,
    listeners: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
}

impl Cell {
    pub(crate) fn new(key: impl Into<String>, value: Value, gate: Gate) -> Self {
        let raw = value.to_string();
        Self::with_raw(key, value, raw, gate)
    }

    /// `raw` must be the serialization of `value`.
    pub(crate) fn with_raw(key: impl Into<String>, value: Value, raw: String, gate: Gate) -> Self {
        Self {
            key: key.into(),
            gate,
            current: Mutex::new(Current { value, raw }),
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn value(&self) -> Value {
        self.current.lock().value.clone()
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Replaces the current value and notifies every listener.
    ///
    /// `raw` must be the serialization of `value`. Returns `false` without
    /// notifying anyone when it equals the current serialization.
    pub(crate) fn publish(&self, value: Value, raw: String) -> bool {
        let _gate = self.gate.lock();
        let snapshot: Vec<(Arc<AtomicBool>, Listener)> = {
            let mut current = self.current.lock();
            if current.raw == raw {
                return false;
            }
            current.value = value.clone();
            current.raw = raw;

            self.listeners
                .lock()
                .iter()
                .map(|entry| (Arc::clone(&entry.active), Arc::clone(&entry.listener)))
                .collect()
        };

        for (active, listener) in snapshot {
            // Skip listeners dropped by an earlier listener in this round
            if active.load(Ordering::Acquire) {
                listener(&value);
            }
        }
        true
    }

    /// Registers a listener and replays the current value to it.
    pub(crate) fn subscribe(self: &Arc<Self>, listener: Listener) -> Subscription {
        let _gate = self.gate.lock();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));

        let replay = {
            let current = self.current.lock();
            self.listeners.lock().push(Entry {
                id,
                active: Arc::clone(&active),
                listener: Arc::clone(&listener),
            });
            current.value.clone()
        };

        listener(&replay);

        Subscription {
            registration: Some(Registration {
                cell: Arc::downgrade(self),
                id,
                active,
            }),
        }
    }

    fn unsubscribe(&self, id: u64) {
        self.listeners.lock().retain(|entry| entry.id != id);
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("key", &self.key)
            .field("raw", &self.current.lock().raw)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

struct Registration {
    cell: Weak<Cell>,
    id: u64,
    active: Arc<AtomicBool>,
}

/// RAII guard for a stream subscriber.
///
/// Dropping the guard (or calling [`unsubscribe`](Self::unsubscribe)) stops
/// further notifications to that subscriber. Other subscribers, the cell's
/// value and the physical store are unaffected.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    registration: Option<Registration>,
}

impl Subscription {
    /// A subscription that was never registered (failed streams).
    pub(crate) fn inert() -> Self {
        Self { registration: None }
    }

    /// Returns true while notifications are still being delivered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.registration
            .as_ref()
            .is_some_and(|reg| reg.active.load(Ordering::Acquire) && reg.cell.strong_count() > 0)
    }

    /// Stops notifications. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(reg) = self.registration.take() {
            reg.active.store(false, Ordering::Release);
            if let Some(cell) = reg.cell.upgrade() {
                cell.unsubscribe(reg.id);
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

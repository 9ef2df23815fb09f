//! The reactive store: one live cell per key, kept in step with the backend.

use super::cell::{Cell, Gate, NULL_RAW};
use super::stream::Stream;
use crate::config::StorageConfig;
use crate::error::{Result, StorageError};
use crate::kv::{Backend, MemoryBackend, RedbBackend};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Key-to-cell mapping. Cells are never removed, so arena slots are stable
/// and iteration follows materialization order.
#[derive(Default)]
struct Cells {
    index: HashMap<String, usize>,
    arena: Vec<Arc<Cell>>,
}

impl Cells {
    fn get(&self, key: &str) -> Option<&Arc<Cell>> {
        self.index.get(key).map(|&slot| &self.arena[slot])
    }

    fn insert(&mut self, cell: Arc<Cell>) {
        self.index.insert(cell.key().to_string(), self.arena.len());
        self.arena.push(cell);
    }
}

struct Inner {
    backend: Backend,
    /// Held from a backend access until its notifications are delivered.
    gate: Gate,
    cells: Mutex<Cells>,
}

/// Reactive facade over a string-keyed store.
///
/// Values are persisted as JSON text and observed as [`Stream`]s that replay
/// the current value on subscription. Writes made through any clone of a
/// store notify every subscriber of that key; writes made directly to the
/// physical store are not observed.
///
/// # Thread Safety
///
/// `LiveStore` is `Clone`; clones share the cell map and backend. Every
/// operation runs to completion before returning, including subscriber
/// notifications. Operations from different threads are serialized per
/// store: the backend write, the cell update and the fan-out happen as one
/// step, so the backend, the cells and the last emission each subscriber
/// saw always agree. Subscribers may call back into the store from their
/// own thread, but must not block on another thread that uses it.
///
/// # Example
///
/// ```ignore
/// use livekv::LiveStore;
///
/// let store = LiveStore::memory();
/// let language = store.get::<String>("my-current-language");
/// let _sub = language.subscribe(|emission| println!("{emission:?}"));
///
/// store.set("my-current-language", "en")?;   // prints Ok(Some("en"))
/// store.set("my-current-language", "en")?;   // unchanged, nothing printed
/// store.remove("my-current-language")?;      // prints Ok(None)
/// ```
#[derive(Clone)]
pub struct LiveStore {
    inner: Arc<Inner>,
}

impl LiveStore {
    /// Creates a store over an already detected backend.
    pub fn new(backend: Backend) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                gate: Gate::default(),
                cells: Mutex::new(Cells::default()),
            }),
        }
    }

    /// Detects the backend from configuration and creates a store over it.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured store cannot be opened.
    pub fn detect(config: &StorageConfig) -> anyhow::Result<Self> {
        Ok(Self::new(Backend::detect(config)?))
    }

    /// Creates a store persisted to a redb file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self::new(Backend::present(RedbBackend::open(path)?)))
    }

    /// Creates a store over a fresh process-local backend.
    pub fn memory() -> Self {
        Self::new(Backend::present(MemoryBackend::new()))
    }

    /// Creates a store with no physical backend at all.
    pub fn in_memory_only() -> Self {
        Self::new(Backend::absent())
    }

    /// The backend handle this store writes through.
    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    /// Returns true if values outlive the store.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.inner.backend.is_present()
    }

    /// Returns the live stream for a key.
    ///
    /// The first successful call materializes the key's cell from the
    /// backend; later calls return a stream over that same cell.
    ///
    /// Never fails directly. If the persisted data cannot be parsed (or the
    /// backend faults) the returned stream carries the error instead of a
    /// value, and nothing is cached: the next call reads the backend again.
    pub fn get<T: DeserializeOwned + 'static>(&self, key: &str) -> Stream<T> {
        let _gate = self.inner.gate.lock();
        let mut cells = self.inner.cells.lock();
        if let Some(cell) = cells.get(key) {
            return Stream::from_cell(Arc::clone(cell));
        }

        let raw = match self.inner.backend.read(key) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read from storage");
                return Stream::failed(key, StorageError::Backend(e));
            },
        };

        let value = match raw {
            Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(key, error = %e, "Invalid data in the storage");
                    return Stream::failed(key, StorageError::parse(key, e));
                },
            },
            None => Value::Null,
        };

        tracing::debug!(key, persisted = !value.is_null(), "Materialized cell");
        let cell = Arc::new(Cell::new(key, value, Arc::clone(&self.inner.gate)));
        cells.insert(Arc::clone(&cell));
        Stream::from_cell(cell)
    }

    /// Persists a value and notifies subscribers if it changed.
    ///
    /// The backend is always written. Subscribers are only notified when the
    /// key has a cell and the value's serialization differs from the
    /// current one. With a backend present, `set` alone never creates a
    /// cell; the next `get` reads the value back. Without one, the cell is
    /// created here since it is the only place the value can live.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized (nothing is
    /// written) or the backend faults.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| StorageError::serialize(key, e))?;
        let raw = value.to_string();

        let _gate = self.inner.gate.lock();
        self.inner.backend.write(key, &raw)?;

        let cell = {
            let mut cells = self.inner.cells.lock();
            match cells.get(key).cloned() {
                Some(cell) => cell,
                None => {
                    // Without a backend the cell is the only copy of the value
                    if !self.inner.backend.is_present() {
                        tracing::debug!(key, "Materialized cell without backend");
                        let gate = Arc::clone(&self.inner.gate);
                        cells.insert(Arc::new(Cell::with_raw(key, value, raw, gate)));
                    }
                    return Ok(());
                },
            }
        };

        if !cell.publish(value, raw) {
            tracing::trace!(key, "Value unchanged; skipping notification");
        }
        Ok(())
    }

    /// Deletes a key and notifies subscribers if it was set.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend faults.
    #[doc(alias = "clear_key")]
    pub fn remove(&self, key: &str) -> Result<()> {
        let _gate = self.inner.gate.lock();
        self.inner.backend.delete(key)?;

        if let Some(cell) = self.cell(key)
            && !cell.publish(Value::Null, NULL_RAW.to_string())
        {
            tracing::trace!(key, "Already unset; skipping notification");
        }
        Ok(())
    }

    /// Deletes every key and unsets every materialized cell.
    ///
    /// Keys the store never materialized are removed from the backend
    /// without any notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend faults; cells are left untouched.
    #[doc(alias = "clear_all")]
    pub fn clear(&self) -> Result<()> {
        let _gate = self.inner.gate.lock();
        self.inner.backend.delete_all()?;

        let cells: Vec<Arc<Cell>> = self.inner.cells.lock().arena.clone();
        let mut notified = 0;
        for cell in &cells {
            if cell.publish(Value::Null, NULL_RAW.to_string()) {
                notified += 1;
            }
        }

        tracing::debug!(cells = cells.len(), notified, "Cleared storage");
        Ok(())
    }

    /// Keys with a materialized cell, in materialization order.
    pub fn cached_keys(&self) -> Vec<String> {
        self.inner
            .cells
            .lock()
            .arena
            .iter()
            .map(|cell| cell.key().to_string())
            .collect()
    }

    fn cell(&self, key: &str) -> Option<Arc<Cell>> {
        self.inner.cells.lock().get(key).cloned()
    }
}

impl fmt::Debug for LiveStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveStore")
            .field("backend", &self.inner.backend)
            .field("cells", &self.inner.cells.lock().arena.len())
            .finish()
    }
}

//! Backend trait for the physical store.
//!
//! Defines the interface that all storage backends must implement,
//! enabling pluggable storage (redb, memory, etc.).

use anyhow::Result;

/// Synchronous, string-keyed storage.
///
/// Mirrors the four-call local storage primitive (`getItem`, `setItem`,
/// `removeItem`, `clear`) plus key enumeration. Keys and values are opaque
/// strings; the reactive layer stores JSON text in the values.
///
/// All backends must be thread-safe (`Send + Sync`) so a store handle can be
/// shared. Faults are returned as-is; callers do not retry.
///
/// # Example
///
/// ```ignore
/// use livekv::kv::{MemoryBackend, StorageBackend};
///
/// let backend = MemoryBackend::new();
/// backend.set_item("key", "\"value\"")?;
/// let value = backend.get_item("key")?;
/// ```
pub trait StorageBackend: Send + Sync + 'static {
    /// Retrieves the raw value for a key.
    ///
    /// Returns `Ok(None)` if the key is unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Stores a raw value, overwriting any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes a key. Removing an unset key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Removes every key in one operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn clear(&self) -> Result<()>;

    /// Lists all stored keys, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn keys(&self) -> Result<Vec<String>>;

    /// Number of stored keys.
    ///
    /// Default implementation uses `keys()`, but backends may override
    /// for efficiency.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn len(&self) -> Result<usize> {
        Ok(self.keys()?.len())
    }

    /// Returns true if no keys are stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

//! In-memory storage backend.
//!
//! Provides a fast, non-persistent key-value store using DashMap for
//! concurrent access. Ideal for testing, development, and embedded use cases.

use super::backend::StorageBackend;
use anyhow::Result;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory storage backend using DashMap.
///
/// Provides fast, concurrent access without persistence. All data is lost
/// when the process exits. Ideal for:
/// - Testing and development
/// - Embedded applications without a writable data directory
///
/// # Thread Safety
///
/// `MemoryBackend` is `Clone`; clones share the same map, so a test can keep
/// a handle and edit the physical contents behind the store's back.
///
/// # Example
///
/// ```ignore
/// use livekv::kv::MemoryBackend;
///
/// let backend = MemoryBackend::new();
/// backend.set_item("key", "\"value\"")?;
/// ```
#[derive(Clone, Default)]
pub struct MemoryBackend {
    data: Arc<DashMap<String, String>>,
}

impl MemoryBackend {
    /// Creates a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.get(key).map(|entry| entry.value().clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.data.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.data.clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.data.iter().map(|entry| entry.key().clone()).collect())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.data.len())
    }
}

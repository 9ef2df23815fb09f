//! Optional backend handle, decided once at construction.

use super::backend::StorageBackend;
use super::memory::MemoryBackend;
use super::redb::RedbBackend;
use crate::config::{BackendKind, StorageConfig};
use crate::paths;
use anyhow::Result;
use std::fmt;
use std::sync::Arc;

/// A physical store that may or may not exist.
///
/// Presence is fixed for the lifetime of the handle. When absent, reads
/// return `None` and writes do nothing, so callers never branch on it.
///
/// # Example
///
/// ```ignore
/// use livekv::config::StorageConfig;
/// use livekv::kv::Backend;
///
/// let backend = Backend::detect(&StorageConfig::from_env()?)?;
/// if !backend.is_present() {
///     // values will not survive the process
/// }
/// ```
#[derive(Clone)]
pub struct Backend {
    inner: Option<Arc<dyn StorageBackend>>,
}

impl Backend {
    /// Wraps an existing store.
    pub fn present<B: StorageBackend>(backend: B) -> Self {
        Self {
            inner: Some(Arc::new(backend)),
        }
    }

    /// Wraps an already shared store.
    pub fn from_arc(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            inner: Some(backend),
        }
    }

    /// A handle with no physical store behind it.
    ///
    /// Logs the one-time notice that persistence is unavailable.
    pub fn absent() -> Self {
        tracing::warn!(
            "Persistent storage is not available on this platform; \
             falling back to in-memory state"
        );
        Self { inner: None }
    }

    /// Examines the environment once and picks the matching backend.
    ///
    /// A `file` backend with no resolvable location is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if a store location was found but cannot be opened.
    pub fn detect(config: &StorageConfig) -> Result<Self> {
        match config.backend {
            BackendKind::None => Ok(Self::absent()),
            BackendKind::Memory => {
                tracing::debug!("Using in-memory storage backend");
                Ok(Self::present(MemoryBackend::new()))
            },
            BackendKind::File => {
                let path = match &config.path {
                    Some(path) => path.clone(),
                    None => match paths::default_storage_path() {
                        Ok(path) => path,
                        Err(e) => {
                            tracing::debug!(error = %e, "No storage location available");
                            return Ok(Self::absent());
                        },
                    },
                };
                Ok(Self::present(RedbBackend::open(&path)?))
            },
        }
    }

    /// Returns true if a physical store backs this handle.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.inner.is_some()
    }

    /// Reads the raw value for a key; `None` when unset or absent.
    ///
    /// # Errors
    ///
    /// Propagates faults from the physical store.
    pub fn read(&self, key: &str) -> Result<Option<String>> {
        match &self.inner {
            Some(backend) => backend.get_item(key),
            None => Ok(None),
        }
    }

    /// Writes a raw value. No-op when absent.
    ///
    /// # Errors
    ///
    /// Propagates faults from the physical store.
    pub fn write(&self, key: &str, raw: &str) -> Result<()> {
        match &self.inner {
            Some(backend) => backend.set_item(key, raw),
            None => Ok(()),
        }
    }

    /// Deletes a key. No-op when absent.
    ///
    /// # Errors
    ///
    /// Propagates faults from the physical store.
    pub fn delete(&self, key: &str) -> Result<()> {
        match &self.inner {
            Some(backend) => backend.remove_item(key),
            None => Ok(()),
        }
    }

    /// Deletes every key. No-op when absent.
    ///
    /// # Errors
    ///
    /// Propagates faults from the physical store.
    pub fn delete_all(&self) -> Result<()> {
        match &self.inner {
            Some(backend) => backend.clear(),
            None => Ok(()),
        }
    }

    /// Lists stored keys; empty when absent.
    ///
    /// # Errors
    ///
    /// Propagates faults from the physical store.
    pub fn keys(&self) -> Result<Vec<String>> {
        match &self.inner {
            Some(backend) => backend.keys(),
            None => Ok(Vec::new()),
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("present", &self.is_present())
            .finish()
    }
}

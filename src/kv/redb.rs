//! Redb-backed storage backend.
//!
//! Provides persistent key-value storage using redb with ACID guarantees.
//! This is the on-disk counterpart of a browser's local storage: one file,
//! string keys, string values.

use super::backend::StorageBackend;
use anyhow::{Context, Result};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

/// Table holding raw string values keyed by string.
const ITEMS_TABLE: TableDefinition<'static, &'static str, &'static str> =
    TableDefinition::new("livekv");

/// Redb-backed storage backend.
///
/// Every mutation is a single committed write transaction, so a crash never
/// leaves a half-written value behind.
///
/// # Thread Safety
///
/// `RedbBackend` is `Clone` and can be shared across threads. The underlying
/// database handles concurrent access safely.
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    /// Opens or creates a redb database at the given path.
    ///
    /// Creates parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory cannot be created
    /// - Database file cannot be opened or created (permissions, disk full, etc.)
    /// - Initialization transaction fails to begin or commit
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create storage directory: {}", parent.display())
            })?;
        }

        let db = Database::create(path)
            .with_context(|| format!("Failed to open storage database: {}", path.display()))?;

        // Initialize table on first open so reads never see a missing table
        let write_txn = db
            .begin_write()
            .context("Failed to begin initialization transaction")?;
        {
            let _table = write_txn
                .open_table(ITEMS_TABLE)
                .context("Failed to initialize storage table")?;
        }
        write_txn
            .commit()
            .context("Failed to commit initialization transaction")?;

        tracing::debug!(path = %path.display(), "Opened storage database");

        Ok(Self { db: Arc::new(db) })
    }
}

impl StorageBackend for RedbBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;

        let table = read_txn
            .open_table(ITEMS_TABLE)
            .context("Failed to open storage table")?;

        let value = table
            .get(key)
            .with_context(|| format!("Failed to read key '{key}'"))?
            .map(|guard| guard.value().to_string());

        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        {
            let mut table = write_txn
                .open_table(ITEMS_TABLE)
                .context("Failed to open storage table")?;

            table
                .insert(key, value)
                .with_context(|| format!("Failed to insert key '{key}'"))?;
        }

        write_txn
            .commit()
            .context("Failed to commit set transaction")?;

        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        {
            let mut table = write_txn
                .open_table(ITEMS_TABLE)
                .context("Failed to open storage table")?;

            table
                .remove(key)
                .with_context(|| format!("Failed to remove key '{key}'"))?;
        }

        write_txn
            .commit()
            .context("Failed to commit remove transaction")?;

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        // Drop and re-create in the same transaction: readers see either the
        // old contents or an empty table, never a missing one.
        write_txn
            .delete_table(ITEMS_TABLE)
            .context("Failed to drop storage table")?;
        {
            let _table = write_txn
                .open_table(ITEMS_TABLE)
                .context("Failed to re-create storage table")?;
        }

        write_txn
            .commit()
            .context("Failed to commit clear transaction")?;

        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;

        let table = read_txn
            .open_table(ITEMS_TABLE)
            .context("Failed to open storage table")?;

        let mut keys = Vec::new();
        for item in table.iter().context("Failed to iterate storage table")? {
            let (key, _value) = item.context("Failed to read storage entry")?;
            keys.push(key.value().to_string());
        }

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_and_get() {
        let tmp = TempDir::new().unwrap();
        let backend = RedbBackend::open(tmp.path().join("test.redb")).unwrap();

        backend.set_item("key1", "\"value1\"").unwrap();
        let value = backend.get_item("key1").unwrap();
        assert_eq!(value.as_deref(), Some("\"value1\""));
    }

    #[test]
    fn test_get_nonexistent_key() {
        let tmp = TempDir::new().unwrap();
        let backend = RedbBackend::open(tmp.path().join("test.redb")).unwrap();

        assert!(backend.get_item("nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let backend = RedbBackend::open(tmp.path().join("test.redb")).unwrap();

        backend.set_item("key1", "1").unwrap();
        backend.remove_item("key1").unwrap();
        backend.remove_item("key1").unwrap();

        assert!(backend.get_item("key1").unwrap().is_none());
    }

    #[test]
    fn test_clear_then_write() {
        let tmp = TempDir::new().unwrap();
        let backend = RedbBackend::open(tmp.path().join("test.redb")).unwrap();

        backend.set_item("a", "1").unwrap();
        backend.set_item("b", "2").unwrap();
        backend.clear().unwrap();

        assert!(backend.is_empty().unwrap());

        // Table is usable again after a clear
        backend.set_item("c", "3").unwrap();
        assert_eq!(backend.keys().unwrap(), vec!["c".to_string()]);
    }

    #[test]
    fn test_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("dir").join("test.redb");

        let backend = RedbBackend::open(&path).unwrap();
        backend.set_item("key", "1").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_persistence_across_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.redb");

        {
            let backend = RedbBackend::open(&path).unwrap();
            backend.set_item("persistent", "{\"a\":1}").unwrap();
        }

        let backend = RedbBackend::open(&path).unwrap();
        assert_eq!(
            backend.get_item("persistent").unwrap().as_deref(),
            Some("{\"a\":1}")
        );
    }
}

//! Physical key-value storage with an optional, detect-once handle.
//!
//! The reactive layer never talks to a store directly. It goes through
//! [`Backend`], which is either present (wrapping a [`StorageBackend`]) or
//! absent for its whole lifetime:
//!
//! - **RedbBackend**: Persistent single-file storage (default for the CLI)
//! - **MemoryBackend**: Fast, non-persistent storage (ideal for testing/embedding)
//!
//! # Example
//!
//! ```ignore
//! use livekv::kv::{Backend, MemoryBackend};
//!
//! let backend = Backend::present(MemoryBackend::new());
//! backend.write("language", "\"en\"")?;
//! assert_eq!(backend.read("language")?, Some("\"en\"".to_string()));
//!
//! // No store in this environment: every call is a no-op.
//! let absent = Backend::absent();
//! assert_eq!(absent.read("language")?, None);
//! ```
//!
//! # Custom Backends
//!
//! Implement the `StorageBackend` trait to use custom storage:
//!
//! ```ignore
//! use livekv::kv::{Backend, StorageBackend};
//!
//! struct SledBackend { /* ... */ }
//! impl StorageBackend for SledBackend { /* ... */ }
//!
//! let backend = Backend::present(SledBackend::new());
//! ```

mod backend;
mod handle;
mod memory;
mod redb;


// Re-export the public API
pub use backend::StorageBackend;
pub use handle::Backend;
pub use memory::MemoryBackend;
pub use self::redb::RedbBackend;

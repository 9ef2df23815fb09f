//! # livekv
//!
//! A reactive facade over a synchronous, string-keyed key-value store.
//!
//! Values are stored as JSON text in a physical store (a redb file, a
//! process-local map, or nothing at all) and observed as live streams:
//! subscribing replays the current value, and every change made through the
//! same store instance is pushed to subscribers synchronously.
//!
//! - [`kv`] - physical stores and the detect-once [`Backend`](kv::Backend) handle
//! - [`store`] - [`LiveStore`], [`Stream`] and [`Subscription`]
//! - [`config`] / [`paths`] - backend selection and default locations
//!
//! ```rust
//! use livekv::LiveStore;
//!
//! # fn main() -> livekv::Result<()> {
//! // No physical store: values live in the cells only.
//! let store = LiveStore::in_memory_only();
//! store.set("x", &1)?;
//!
//! let x = store.get::<i32>("x");
//! assert_eq!(x.value().ok().flatten(), Some(1));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod kv;
pub mod paths;
pub mod store;

pub use error::{Result, StorageError};
pub use store::{Emission, LiveStore, Stream, Subscription};

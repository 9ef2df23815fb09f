//! Reactive state layer.
//!
//! [`LiveStore`] owns one cell per key it has been asked about. A cell holds
//! the key's current value and its subscribers; it is created lazily on the
//! first successful [`get`](LiveStore::get) and kept for the lifetime of the
//! store.
//!
//! # Consistency
//!
//! - Writes go to the backend first, then to the cell (if any).
//! - A write whose JSON serialization equals the cell's current one is
//!   persisted but not re-emitted.
//! - Malformed persisted data surfaces as an error on the returned stream and
//!   is never cached.
//!
//! # Example
//!
//! ```rust
//! use livekv::LiveStore;
//! use std::sync::{Arc, Mutex};
//!
//! # fn main() -> livekv::Result<()> {
//! let store = LiveStore::memory();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! let _sub = store.get::<u32>("count").subscribe(move |emission| {
//!     sink.lock().unwrap().push(emission.ok().flatten());
//! });
//!
//! store.set("count", &1)?;
//! store.set("count", &1)?; // deduplicated
//! store.remove("count")?;
//!
//! assert_eq!(*seen.lock().unwrap(), vec![None, Some(1), None]);
//! # Ok(())
//! # }
//! ```

mod cell;
mod live;
mod stream;


pub use cell::Subscription;
pub use live::LiveStore;
pub use stream::{Emission, Stream};

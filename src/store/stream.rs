//! Typed view over a cell, or over a failed lookup.

use super::cell::{Cell, Subscription};
use crate::error::StorageError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// One notification delivered to a subscriber.
///
/// `Ok(None)` means the key is unset. Errors are shared so a failed stream
/// can hand the same error to every subscriber.
pub type Emission<T> = std::result::Result<Option<T>, Arc<StorageError>>;

enum Source {
    Cell(Arc<Cell>),
    Failed { key: String, error: Arc<StorageError> },
}

/// Live value of one key, as returned by [`LiveStore::get`](crate::LiveStore::get).
///
/// Subscribing replays the current value immediately, then delivers every
/// change published through the store. All streams for a key share one cell,
/// so they observe the same sequence.
///
/// A stream created from unreadable persisted data carries only an error:
/// each subscriber receives it once and nothing else.
pub struct Stream<T> {
    source: Source,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned + 'static> Stream<T> {
    pub(crate) fn from_cell(cell: Arc<Cell>) -> Self {
        Self {
            source: Source::Cell(cell),
            _marker: PhantomData,
        }
    }

    pub(crate) fn failed(key: impl Into<String>, error: StorageError) -> Self {
        Self {
            source: Source::Failed {
                key: key.into(),
                error: Arc::new(error),
            },
            _marker: PhantomData,
        }
    }

    /// Registers a subscriber.
    ///
    /// The subscriber is called before this returns with the current value
    /// (or the stream's error), then once per change, in subscription order
    /// relative to other subscribers.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let sub = store.get::<String>("language").subscribe(|emission| {
    ///     if let Ok(Some(language)) = emission {
    ///         println!("language is now {language}");
    ///     }
    /// });
    /// ```
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(Emission<T>) + Send + Sync + 'static,
    {
        match &self.source {
            Source::Cell(cell) => {
                let key = cell.key().to_string();
                cell.subscribe(Arc::new(move |value: &Value| {
                    observer(decode(&key, value));
                }))
            },
            Source::Failed { error, .. } => {
                observer(Err(Arc::clone(error)));
                Subscription::inert()
            },
        }
    }

    /// Latest emission, without subscribing.
    pub fn value(&self) -> Emission<T> {
        match &self.source {
            Source::Cell(cell) => decode(cell.key(), &cell.value()),
            Source::Failed { error, .. } => Err(Arc::clone(error)),
        }
    }
}

impl<T> Stream<T> {
    /// Key this stream observes.
    pub fn key(&self) -> &str {
        match &self.source {
            Source::Cell(cell) => cell.key(),
            Source::Failed { key, .. } => key,
        }
    }

    /// Returns true if the lookup failed and this stream carries only an error.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.source, Source::Failed { .. })
    }

    /// Returns true if both streams are backed by the same cell.
    ///
    /// Failed streams are never equal to anything.
    #[must_use]
    pub fn ptr_eq<U>(&self, other: &Stream<U>) -> bool {
        match (&self.source, &other.source) {
            (Source::Cell(a), Source::Cell(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Number of live subscribers on the underlying cell.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        match &self.source {
            Source::Cell(cell) => cell.listener_count(),
            Source::Failed { .. } => 0,
        }
    }
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        let source = match &self.source {
            Source::Cell(cell) => Source::Cell(Arc::clone(cell)),
            Source::Failed { key, error } => Source::Failed {
                key: key.clone(),
                error: Arc::clone(error),
            },
        };
        Self {
            source,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Cell(cell) => f.debug_tuple("Stream").field(cell).finish(),
            Source::Failed { key, error } => f
                .debug_struct("Stream")
                .field("key", key)
                .field("error", &error.to_string())
                .finish(),
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> Emission<T> {
    if value.is_null() {
        return Ok(None);
    }
    T::deserialize(value)
        .map(Some)
        .map_err(|e| Arc::new(StorageError::decode(key, e)))
}

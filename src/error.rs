//! Error types for the reactive store.
//!
//! Backend faults stay `anyhow::Error` all the way up so their context chain
//! survives; everything the store itself detects gets a typed variant.

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors surfaced by [`LiveStore`](crate::LiveStore) and its streams.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Persisted raw data is not valid JSON.
    #[error("the raw data for key '{key}' cannot be parsed; invalid data in the storage")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The live value is valid JSON but does not match the requested type.
    #[error("the value for key '{key}' does not match the requested type")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The value handed to `set` cannot be serialized.
    #[error("the value for key '{key}' cannot be serialized")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Unexpected fault from the physical store (quota, permissions, I/O).
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StorageError {
    /// Create a parse error for a key.
    pub fn parse(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            key: key.into(),
            source,
        }
    }

    /// Create a decode error for a key.
    pub fn decode(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            key: key.into(),
            source,
        }
    }

    /// Create a serialize error for a key.
    pub fn serialize(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialize {
            key: key.into(),
            source,
        }
    }

    /// Returns true if this error came from malformed persisted data.
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Key the error relates to, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Parse { key, .. } | Self::Decode { key, .. } | Self::Serialize { key, .. } => {
                Some(key)
            },
            Self::Backend(_) => None,
        }
    }
}

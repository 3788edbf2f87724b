//! Error types for the cache layer.

/// Errors that can occur in the cache layer.
///
/// Most of these never reach callers of [`crate::FallbackCache`]: tier access
/// failures are logged and swallowed there. They surface from the lower
/// [`crate::KeyValueStore`] / [`crate::CacheHandle`] level, from
/// [`crate::CacheRegistry::cache`] for unresolvable names, and from
/// `get_with` when a value loader fails.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to reach the backing key-value store.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// The backing key-value store returned an error.
    #[error("Backend error: {message}")]
    Backend {
        /// Description of the backend error.
        message: String,
    },

    /// A cached value could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The requested cache name is not configured on the backing manager.
    ///
    /// This indicates a configuration defect, not a transient condition, so
    /// it propagates out of the registry instead of being swallowed.
    #[error("Unknown cache: {name}")]
    UnknownCache {
        /// The unresolvable cache name.
        name: String,
    },

    /// A value loader passed to `get_with` failed.
    ///
    /// The cache is left unmodified when this is returned.
    #[error("Failed to load value for cache key '{key}': {source}")]
    ValueRetrieval {
        /// The key the loader was invoked for.
        key: String,
        /// The underlying loader failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CacheError {
    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Creates a new `UnknownCache` error.
    #[must_use]
    pub fn unknown_cache(name: impl Into<String>) -> Self {
        Self::UnknownCache { name: name.into() }
    }

    /// Creates a new `ValueRetrieval` error wrapping a loader failure.
    #[must_use]
    pub fn value_retrieval(
        key: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ValueRetrieval {
            key: key.into(),
            source: source.into(),
        }
    }

    /// Returns `true` if this is an unknown-cache error.
    #[must_use]
    pub fn is_unknown_cache(&self) -> bool {
        matches!(self, Self::UnknownCache { .. })
    }

    /// Returns `true` if this is a value-retrieval error.
    #[must_use]
    pub fn is_value_retrieval(&self) -> bool {
        matches!(self, Self::ValueRetrieval { .. })
    }
}

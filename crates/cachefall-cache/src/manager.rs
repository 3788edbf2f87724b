//! Backing cache managers: resolve logical names to cache handles.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::CacheResult;
use crate::error::CacheError;
use crate::handle::CacheHandle;
use crate::kv::DynKeyValueStore;

/// Resolves logical cache names to handles over one tier's backing store.
///
/// `resolve` must be idempotent per name: resolving the same name twice
/// yields handles addressing the same namespace.
pub trait CacheManager: Send + Sync {
    /// Resolves a handle for `name`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::UnknownCache` when `name` is not configured on
    /// this manager. That is a configuration defect and is never swallowed.
    fn resolve(&self, name: &str) -> CacheResult<CacheHandle>;

    /// The logical cache names this manager knows about.
    fn cache_names(&self) -> Vec<String>;
}

/// Type alias for a shared cache manager trait object.
pub type DynCacheManager = Arc<dyn CacheManager>;

/// A cache manager over a single key-value store and a configured name set.
pub struct KvCacheManager {
    store: DynKeyValueStore,
    names: BTreeSet<String>,
    ttl: Option<Duration>,
}

impl KvCacheManager {
    /// Creates a manager for the given names, applying `ttl` to all writes.
    pub fn new(
        store: DynKeyValueStore,
        names: impl IntoIterator<Item = String>,
        ttl: Option<Duration>,
    ) -> Self {
        Self {
            store,
            names: names.into_iter().collect(),
            ttl,
        }
    }
}

impl CacheManager for KvCacheManager {
    fn resolve(&self, name: &str) -> CacheResult<CacheHandle> {
        if !self.names.contains(name) {
            return Err(CacheError::unknown_cache(name));
        }
        Ok(CacheHandle::new(name, self.store.clone(), self.ttl))
    }

    fn cache_names(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }
}

//! Cache handles: named views over one key-value store.

use std::sync::Arc;
use std::time::Duration;

use crate::CacheResult;
use crate::kv::{DynKeyValueStore, KeyValueStore};

/// A named cache over one backing key-value store.
///
/// Physical keys are namespaced as `"{name}:{key}"` so distinct logical
/// caches sharing a store never collide. Handles are immutable after
/// construction and cheap to clone.
#[derive(Clone)]
pub struct CacheHandle {
    name: Arc<str>,
    store: DynKeyValueStore,
    ttl: Option<Duration>,
}

impl CacheHandle {
    /// Creates a new handle for the given logical cache name.
    pub fn new(name: impl Into<Arc<str>>, store: DynKeyValueStore, ttl: Option<Duration>) -> Self {
        Self {
            name: name.into(),
            store,
            ttl,
        }
    }

    /// The logical cache name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn physical_key(&self, key: &str) -> String {
        format!("{}:{}", self.name, key)
    }

    fn prefix(&self) -> String {
        format!("{}:", self.name)
    }

    /// Reads a value from this cache's namespace.
    pub async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.store.get(&self.physical_key(key)).await
    }

    /// Writes a value, applying this handle's TTL if one is configured.
    pub async fn put(&self, key: &str, value: &[u8]) -> CacheResult<()> {
        self.store
            .set(&self.physical_key(key), value, self.ttl)
            .await
    }

    /// Removes a key. Returns `true` if it existed.
    pub async fn evict(&self, key: &str) -> CacheResult<bool> {
        self.store.delete(&self.physical_key(key)).await
    }

    /// Clears this cache's entire namespace. Returns the number of keys removed.
    pub async fn clear(&self) -> CacheResult<u64> {
        self.store.clear_prefix(&self.prefix()).await
    }

    /// Checks connectivity of the backing store.
    pub async fn ping(&self) -> CacheResult<()> {
        self.store.ping().await
    }
}

impl std::fmt::Debug for CacheHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheHandle")
            .field("name", &self.name)
            .field("store", &self.store.store_name())
            .field("ttl", &self.ttl)
            .finish()
    }
}

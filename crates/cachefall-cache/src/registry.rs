//! The cache registry: one memoized fallback cache per logical name.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

use crate::CacheResult;
use crate::fallback::FallbackCache;
use crate::manager::{CacheManager, DynCacheManager};

/// Produces and memoizes one [`FallbackCache`] per logical cache name.
///
/// Entries live for the registry's lifetime; the mapping itself is never
/// evicted. Get-or-create is atomic per name: even when two tasks race on
/// first access, exactly one `FallbackCache` instance ever becomes visible
/// for a given name. Unrelated names are not serialized against each other
/// (the map is sharded).
pub struct CacheRegistry {
    primary: DynCacheManager,
    secondary: Option<DynCacheManager>,
    caches: DashMap<String, Arc<FallbackCache>>,
}

impl CacheRegistry {
    /// Creates a registry over a master manager only.
    pub fn new(primary: DynCacheManager) -> Self {
        Self {
            primary,
            secondary: None,
            caches: DashMap::new(),
        }
    }

    /// Creates a registry over a master manager and a replica manager.
    pub fn with_secondary(primary: DynCacheManager, secondary: DynCacheManager) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
            caches: DashMap::new(),
        }
    }

    /// Returns the fallback cache for `name`, creating it on first access.
    ///
    /// # Errors
    ///
    /// A master-tier resolve failure propagates: an unresolvable name is a
    /// configuration defect. A replica-tier resolve failure only degrades
    /// the cache to master-only, with a logged warning.
    pub fn cache(&self, name: &str) -> CacheResult<Arc<FallbackCache>> {
        match self.caches.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let primary = self.primary.resolve(name)?;
                let secondary = match &self.secondary {
                    Some(manager) => match manager.resolve(name) {
                        Ok(handle) => Some(handle),
                        Err(e) => {
                            tracing::warn!(
                                cache = name,
                                error = %e,
                                "replica manager could not resolve cache, running master-only"
                            );
                            None
                        }
                    },
                    None => None,
                };
                let cache = Arc::new(FallbackCache::new(primary, secondary));
                entry.insert(cache.clone());
                Ok(cache)
            }
        }
    }

    /// The logical cache names, as known to the master manager.
    ///
    /// The replica manager is advisory and is not consulted.
    pub fn cache_names(&self) -> Vec<String> {
        self.primary.cache_names()
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("caches", &self.caches.len())
            .field("has_secondary", &self.secondary.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;
    use crate::manager::{CacheManager, KvCacheManager};

    fn manager(names: &[&str]) -> DynCacheManager {
        Arc::new(KvCacheManager::new(
            Arc::new(MemoryKvStore::new()),
            names.iter().map(|n| n.to_string()),
            None,
        ))
    }

    #[test]
    fn test_cache_is_memoized() {
        let registry = CacheRegistry::new(manager(&["users"]));

        let first = registry.cache("users").unwrap();
        let second = registry.cache("users").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unknown_name_propagates() {
        let registry = CacheRegistry::new(manager(&["users"]));
        let err = registry.cache("sessions").unwrap_err();
        assert!(err.is_unknown_cache());
    }

    #[test]
    fn test_cache_names_delegate_to_primary_only() {
        // Replica knows extra names; they must not leak into the registry
        let registry =
            CacheRegistry::with_secondary(manager(&["users"]), manager(&["users", "sessions"]));
        assert_eq!(registry.cache_names(), vec!["users"]);
    }

    #[test]
    fn test_replica_resolve_failure_degrades_to_master_only() {
        let registry = CacheRegistry::with_secondary(manager(&["users"]), manager(&["sessions"]));

        let cache = registry.cache("users").unwrap();
        assert!(!cache.has_secondary());
    }

    #[test]
    fn test_secondary_attached_when_resolvable() {
        let registry = CacheRegistry::with_secondary(manager(&["users"]), manager(&["users"]));
        let cache = registry.cache("users").unwrap();
        assert!(cache.has_secondary());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_access_yields_one_instance() {
        let registry = Arc::new(CacheRegistry::new(manager(&["users"])));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                registry.cache("users").unwrap()
            }));
        }

        let mut instances = Vec::new();
        for task in tasks {
            instances.push(task.await.unwrap());
        }
        let first = &instances[0];
        assert!(instances.iter().all(|c| Arc::ptr_eq(first, c)));
    }

    #[test]
    fn test_manager_resolves_idempotently_through_registry() {
        let primary = manager(&["users", "orders"]);
        let registry = CacheRegistry::new(primary.clone());

        let users = registry.cache("users").unwrap();
        let orders = registry.cache("orders").unwrap();
        assert_eq!(users.name(), "users");
        assert_eq!(orders.name(), "orders");
        assert!(!Arc::ptr_eq(&users, &orders));

        // resolve stays idempotent outside the registry too
        assert_eq!(primary.resolve("users").unwrap().name(), "users");
    }
}

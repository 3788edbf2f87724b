//! User service: CRUD over the store with explicit cache choreography.
//!
//! Every cache interaction is an explicit call at the start or end of an
//! operation, so the read-preference and invalidation behavior is visible
//! at the call site and testable without any interception machinery.

use std::sync::Arc;

use cachefall_cache::{CacheError, FallbackCache};
use cachefall_storage::{DynUserStore, NewUser, StorageError, User, UserStore};

/// The logical cache name for user records.
pub const USERS_CACHE: &str = "users";

const ALL_USERS_KEY: &str = "all-users";

fn id_key(id: i64) -> String {
    format!("id:{id}")
}

fn name_key(name: &str) -> String {
    format!("name:{}", name.to_lowercase())
}

/// Errors surfaced by the user service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ServiceError {
    /// Returns `true` when the error means "no such user".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_not_found())
    }
}

/// CRUD service over the user store, caching reads through one fallback
/// cache instance (the `"users"` logical cache).
///
/// The store is the source of truth; cache writes and evictions are
/// best-effort and their failure never fails the operation.
pub struct UserService {
    store: DynUserStore,
    cache: Arc<FallbackCache>,
}

impl UserService {
    pub fn new(store: DynUserStore, cache: Arc<FallbackCache>) -> Self {
        Self { store, cache }
    }

    /// Lists all users, cached as one entry under `"all-users"`.
    pub async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        let store = self.store.clone();
        let bytes = self
            .cache
            .get_with(ALL_USERS_KEY, || async move {
                tracing::info!("fetching all users from store");
                let users = store.list().await.map_err(ServiceError::from)?;
                serde_json::to_vec(&users).map_err(|e| ServiceError::Cache(e.into()))
            })
            .await?;
        decode(&bytes)
    }

    /// Reads a user by ID.
    ///
    /// Cached under `"id:{id}"`. An absent user is a plain miss and is never
    /// cached, so a later creation with that ID becomes visible immediately.
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, ServiceError> {
        let key = id_key(id);
        if let Some(user) = self.cached_user(&key).await {
            return Ok(Some(user));
        }

        let user = self.store.get(id).await?;
        if let Some(user) = &user {
            self.cache_user(&key, user).await;
        }
        Ok(user)
    }

    /// Finds a user by name (case-insensitive), cached under
    /// `"name:{lowercased}"`.
    pub async fn get_user_by_name(&self, name: &str) -> Result<Option<User>, ServiceError> {
        let key = name_key(name);
        if let Some(user) = self.cached_user(&key).await {
            return Ok(Some(user));
        }

        tracing::info!(name, "fetching user by name from store");
        let user = self.store.find_by_name(name).await?;
        if let Some(user) = &user {
            self.cache_user(&key, user).await;
        }
        Ok(user)
    }

    /// Creates a user, caches it by ID and invalidates the list entry.
    pub async fn create_user(&self, user: &NewUser) -> Result<User, ServiceError> {
        tracing::info!(name = %user.name, "creating user");
        let created = self.store.create(user).await?;

        self.cache_user(&id_key(created.id), &created).await;
        self.cache.evict(ALL_USERS_KEY).await;
        Ok(created)
    }

    /// Creates several users and invalidates the list entry.
    pub async fn create_users_bulk(&self, users: &[NewUser]) -> Result<Vec<User>, ServiceError> {
        tracing::info!(count = users.len(), "creating users in bulk");
        let created = self.store.create_bulk(users).await?;

        self.cache.evict(ALL_USERS_KEY).await;
        Ok(created)
    }

    /// Updates a user; refreshes its ID entry and invalidates the list entry.
    pub async fn update_user(&self, id: i64, update: &NewUser) -> Result<Option<User>, ServiceError> {
        tracing::info!(id, "updating user");
        let updated = self.store.update(id, update).await?;

        if let Some(user) = &updated {
            self.cache_user(&id_key(id), user).await;
            self.cache.evict(ALL_USERS_KEY).await;
        }
        Ok(updated)
    }

    /// Deletes a user and evicts its ID entry plus the list entry.
    pub async fn delete_user(&self, id: i64) -> Result<(), ServiceError> {
        tracing::info!(id, "deleting user");
        self.store.delete(id).await?;

        self.cache.evict(&id_key(id)).await;
        self.cache.evict(ALL_USERS_KEY).await;
        Ok(())
    }

    async fn cached_user(&self, key: &str) -> Option<User> {
        let bytes = self.cache.get(key).await?;
        match serde_json::from_slice(&bytes) {
            Ok(user) => Some(user),
            Err(e) => {
                // Undecodable entries are dropped so the store repopulates them
                tracing::warn!(key, error = %e, "corrupt cache entry, evicting");
                self.cache.evict(key).await;
                None
            }
        }
    }

    async fn cache_user(&self, key: &str, user: &User) {
        match serde_json::to_vec(user) {
            Ok(bytes) => self.cache.put(key, &bytes).await,
            Err(e) => tracing::warn!(key, error = %e, "failed to encode user for caching"),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, ServiceError> {
    serde_json::from_slice(bytes).map_err(|e| ServiceError::Cache(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachefall_cache::{CacheRegistry, DynCacheManager, KvCacheManager, MemoryKvStore};
    use cachefall_db_memory::InMemoryUserStore;

    fn service() -> (UserService, Arc<FallbackCache>, DynUserStore) {
        let manager: DynCacheManager = Arc::new(KvCacheManager::new(
            Arc::new(MemoryKvStore::new()),
            vec![USERS_CACHE.to_string()],
            None,
        ));
        let registry = CacheRegistry::new(manager);
        let cache = registry.cache(USERS_CACHE).unwrap();
        let store: DynUserStore = Arc::new(InMemoryUserStore::new());
        (UserService::new(store.clone(), cache.clone()), cache, store)
    }

    fn alice() -> NewUser {
        NewUser {
            name: "Alice".into(),
            email: "alice@example.com".into(),
            designation: "Engineer".into(),
        }
    }

    #[tokio::test]
    async fn test_create_populates_id_entry() {
        let (service, cache, _) = service();
        let created = service.create_user(&alice()).await.unwrap();

        let cached = cache.get(&format!("id:{}", created.id)).await.unwrap();
        let user: User = serde_json::from_slice(&cached).unwrap();
        assert_eq!(user, created);
    }

    #[tokio::test]
    async fn test_get_user_caches_hit_but_not_miss() {
        let (service, cache, _) = service();
        let created = service.create_user(&alice()).await.unwrap();
        cache.clear().await;

        // First read repopulates the cache
        let fetched = service.get_user(created.id).await.unwrap();
        assert_eq!(fetched, Some(created.clone()));
        assert!(cache.get(&format!("id:{}", created.id)).await.is_some());

        // Absent users are not cached
        assert_eq!(service.get_user(999).await.unwrap(), None);
        assert!(cache.get("id:999").await.is_none());
    }

    #[tokio::test]
    async fn test_get_user_prefers_cache_over_store() {
        let (service, cache, store) = service();
        let created = service.create_user(&alice()).await.unwrap();

        // Remove from the store; the cached entry still serves reads
        store.delete(created.id).await.unwrap();
        let fetched = service.get_user(created.id).await.unwrap();
        assert_eq!(fetched, Some(created.clone()));

        cache.clear().await;
        assert_eq!(service.get_user(created.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_users_cached_and_invalidated_on_create() {
        let (service, _, store) = service();
        service.create_user(&alice()).await.unwrap();

        let listed = service.list_users().await.unwrap();
        assert_eq!(listed.len(), 1);

        // A write behind the cache's back is invisible until invalidation
        store
            .create(&NewUser {
                name: "Bob".into(),
                email: "bob@example.com".into(),
                designation: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(service.list_users().await.unwrap().len(), 1);

        // create_user evicts "all-users", so the next list sees everything
        service
            .create_user(&NewUser {
                name: "Carol".into(),
                email: "carol@example.com".into(),
                designation: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(service.list_users().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_get_by_name_uses_lowercased_key() {
        let (service, cache, _) = service();
        service.create_user(&alice()).await.unwrap();

        let found = service.get_user_by_name("ALICE").await.unwrap();
        assert_eq!(found.map(|u| u.name), Some("Alice".to_string()));
        assert!(cache.get("name:alice").await.is_some());
    }

    #[tokio::test]
    async fn test_update_refreshes_cache() {
        let (service, cache, _) = service();
        let created = service.create_user(&alice()).await.unwrap();

        let updated = service
            .update_user(
                created.id,
                &NewUser {
                    name: "Alicia".into(),
                    email: "alice@example.com".into(),
                    designation: "Staff Engineer".into(),
                },
            )
            .await
            .unwrap()
            .expect("user exists");

        let cached = cache.get(&format!("id:{}", created.id)).await.unwrap();
        let user: User = serde_json::from_slice(&cached).unwrap();
        assert_eq!(user, updated);

        assert!(service.update_user(999, &alice()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_evicts_entries() {
        let (service, cache, _) = service();
        let created = service.create_user(&alice()).await.unwrap();
        service.list_users().await.unwrap();

        service.delete_user(created.id).await.unwrap();
        assert!(cache.get(&format!("id:{}", created.id)).await.is_none());
        assert!(cache.get("all-users").await.is_none());

        let err = service.delete_user(created.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_corrupt_cache_entry_is_evicted_and_recovered() {
        let (service, cache, _) = service();
        let created = service.create_user(&alice()).await.unwrap();

        cache
            .put(&format!("id:{}", created.id), b"not json")
            .await;
        let fetched = service.get_user(created.id).await.unwrap();
        assert_eq!(fetched, Some(created));
    }
}

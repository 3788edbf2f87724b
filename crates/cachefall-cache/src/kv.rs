//! Key-value store clients backing the cache tiers.
//!
//! Two implementations are provided: [`RedisKvStore`] over a connection pool
//! and [`MemoryKvStore`] over a process-local concurrent map. The memory
//! store doubles as the degraded mode used when Redis is disabled or
//! unreachable at startup.

use async_trait::async_trait;
use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::CacheResult;
use crate::error::CacheError;

/// The client contract for one cache tier's backing store.
///
/// Keys here are physical keys; namespacing per logical cache name is the
/// job of [`crate::CacheHandle`]. Any operation may fail with a
/// connectivity or backend error, which upper layers treat per the fallback
/// policy.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value. Returns `None` when the key is absent.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Writes a value, optionally with a time-to-live.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> CacheResult<()>;

    /// Deletes a key. Returns `true` if the key existed.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Deletes every key starting with `prefix`. Returns the number removed.
    async fn clear_prefix(&self, prefix: &str) -> CacheResult<u64>;

    /// Checks connectivity to the backing store.
    async fn ping(&self) -> CacheResult<()>;

    /// Returns the name of this store for logging/debugging.
    fn store_name(&self) -> &'static str;
}

/// Type alias for a shared key-value store trait object.
pub type DynKeyValueStore = Arc<dyn KeyValueStore>;

// ==================== Redis ====================

/// Redis-backed key-value store over a deadpool connection pool.
pub struct RedisKvStore {
    pool: Pool,
}

impl RedisKvStore {
    /// Creates a new store over an existing pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> CacheResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::connection(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for RedisKvStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.conn().await?;
        conn.get::<_, Option<Vec<u8>>>(key)
            .await
            .map_err(|e| CacheError::backend(e.to_string()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        match ttl {
            Some(ttl) => conn
                .set_ex::<_, _, ()>(key, value, ttl.as_secs())
                .await
                .map_err(|e| CacheError::backend(e.to_string())),
            None => conn
                .set::<_, _, ()>(key, value)
                .await
                .map_err(|e| CacheError::backend(e.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        let removed: i64 = conn
            .del(key)
            .await
            .map_err(|e| CacheError::backend(e.to_string()))?;
        Ok(removed > 0)
    }

    async fn clear_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let mut conn = self.conn().await?;
        let pattern = format!("{prefix}*");

        // SCAN instead of KEYS so clearing a namespace never blocks the server
        let mut keys: Vec<String> = Vec::new();
        {
            let mut iter = conn
                .scan_match::<_, String>(&pattern)
                .await
                .map_err(|e| CacheError::backend(e.to_string()))?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }

        if keys.is_empty() {
            return Ok(0);
        }
        let removed: i64 = conn
            .del(&keys)
            .await
            .map_err(|e| CacheError::backend(e.to_string()))?;
        Ok(removed as u64)
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        let _pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::backend(e.to_string()))?;
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "redis"
    }
}

// ==================== In-memory ====================

/// A stored entry with optional expiry.
#[derive(Clone, Debug)]
struct StoredEntry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self {
            data,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| Instant::now() > deadline)
    }
}

/// Process-local key-value store over a concurrent map.
///
/// Used as the primary tier when Redis is disabled, and as the workhorse of
/// unit tests. Expired entries are dropped lazily on read.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    data: DashMap<String, StoredEntry>,
}

impl MemoryKvStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries (test/introspection helper).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        if let Some(entry) = self.data.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.data.remove(key);
                return Ok(None);
            }
            return Ok(Some(entry.data.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> CacheResult<()> {
        self.data
            .insert(key.to_string(), StoredEntry::new(value.to_vec(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.data.remove(key).is_some())
    }

    async fn clear_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let mut removed = 0u64;
        self.data.retain(|key, _| {
            if key.starts_with(prefix) {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

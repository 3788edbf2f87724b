//! The fallback cache: one interface over a master/replica pair of tiers.

use std::future::Future;

use crate::CacheResult;
use crate::error::CacheError;
use crate::handle::CacheHandle;

/// A cache decorator over a master (primary) handle and an optional replica
/// (secondary) handle.
///
/// Reads prefer the replica and fall back to the master; writes, evicts and
/// clears go to the master first and are mirrored to the replica
/// best-effort. The store upstream of this layer remains the source of
/// truth, so tier failures on the write path are logged and swallowed
/// rather than surfaced to callers.
///
/// Instances are immutable after construction and safe to share across
/// tasks without further locking.
pub struct FallbackCache {
    primary: CacheHandle,
    secondary: Option<CacheHandle>,
}

impl FallbackCache {
    /// Creates a fallback cache over a master handle and an optional replica.
    pub fn new(primary: CacheHandle, secondary: Option<CacheHandle>) -> Self {
        Self { primary, secondary }
    }

    /// The logical cache name (taken from the master handle).
    pub fn name(&self) -> &str {
        self.primary.name()
    }

    /// Whether a replica tier is configured.
    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    /// Reads a value, preferring the replica tier.
    ///
    /// A replica hit wins. A replica miss is not authoritative (the value may
    /// not have replicated yet), so it always falls through to the master. A
    /// replica error falls back to the master. Master errors are logged and
    /// degrade to a miss; this method never fails and never panics, even
    /// with both tiers down.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        if let Some(secondary) = &self.secondary {
            match secondary.get(key).await {
                Ok(Some(value)) => {
                    tracing::debug!(cache = self.name(), key, "cache hit (replica)");
                    return Some(value);
                }
                Ok(None) => {
                    tracing::debug!(cache = self.name(), key, "replica miss, checking master");
                }
                Err(e) => {
                    tracing::warn!(
                        cache = self.name(),
                        key,
                        error = %e,
                        "replica read failed, falling back to master"
                    );
                }
            }
        }

        match self.primary.get(key).await {
            Ok(Some(value)) => {
                tracing::debug!(cache = self.name(), key, "cache hit (master)");
                Some(value)
            }
            Ok(None) => {
                tracing::debug!(cache = self.name(), key, "cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(
                    cache = self.name(),
                    key,
                    error = %e,
                    "master read failed, treating as miss"
                );
                None
            }
        }
    }

    /// Reads a value, invoking `loader` on a miss and caching its result.
    ///
    /// The loader runs at most once per call. A loader failure is returned as
    /// [`CacheError::ValueRetrieval`] identifying the key and the cause, and
    /// the cache is left unmodified.
    pub async fn get_with<F, Fut, E>(&self, key: &str, loader: F) -> CacheResult<Vec<u8>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>, E>>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = loader()
            .await
            .map_err(|e| CacheError::value_retrieval(key, e))?;
        self.put(key, &value).await;
        Ok(value)
    }

    /// Writes a value to the master, then mirrors it to the replica.
    ///
    /// Each tier's failure is logged and swallowed independently; callers are
    /// never notified of cache write failures.
    pub async fn put(&self, key: &str, value: &[u8]) {
        if let Err(e) = self.primary.put(key, value).await {
            tracing::warn!(
                cache = self.name(),
                key,
                error = %e,
                "master cache write failed"
            );
        }
        if let Some(secondary) = &self.secondary {
            if let Err(e) = secondary.put(key, value).await {
                tracing::warn!(
                    cache = self.name(),
                    key,
                    error = %e,
                    "replica cache write failed"
                );
            }
        }
    }

    /// Removes a key from both tiers, best-effort.
    pub async fn evict(&self, key: &str) {
        if let Err(e) = self.primary.evict(key).await {
            tracing::warn!(
                cache = self.name(),
                key,
                error = %e,
                "master cache evict failed"
            );
        }
        if let Some(secondary) = &self.secondary {
            if let Err(e) = secondary.evict(key).await {
                tracing::warn!(
                    cache = self.name(),
                    key,
                    error = %e,
                    "replica cache evict failed"
                );
            }
        }
    }

    /// Clears this cache's namespace on both tiers, best-effort.
    pub async fn clear(&self) {
        if let Err(e) = self.primary.clear().await {
            tracing::warn!(cache = self.name(), error = %e, "master cache clear failed");
        }
        if let Some(secondary) = &self.secondary {
            if let Err(e) = secondary.clear().await {
                tracing::warn!(cache = self.name(), error = %e, "replica cache clear failed");
            }
        }
    }
}

impl std::fmt::Debug for FallbackCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackCache")
            .field("name", &self.name())
            .field("has_secondary", &self.has_secondary())
            .finish()
    }
}

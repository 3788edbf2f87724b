//! # cachefall-cache
//!
//! The fallback cache core: cache tiers over key-value stores, a read/write
//! fallback policy, and a registry of per-name cache instances.
//!
//! ## Architecture
//!
//! ```text
//! CacheRegistry ── name ──▶ FallbackCache
//!                              │        │
//!                           master   replica (optional)
//!                         CacheHandle  CacheHandle
//!                              │        │
//!                       KeyValueStore (Redis or in-memory)
//! ```
//!
//! ## Fallback policy
//!
//! - Reads prefer the replica tier; a replica error or miss falls through to
//!   the master. Read failures degrade to a miss, never an error.
//! - Writes, evictions and clears hit the master first, then mirror to the
//!   replica; each tier's failure is logged and swallowed independently.
//!
//! The user store above this layer stays the source of truth, so cache
//! inconsistency is always recoverable.
//!
//! ## Example
//!
//! ```ignore
//! use cachefall_cache::{CacheRegistry, KvCacheManager, MemoryKvStore};
//! use std::sync::Arc;
//!
//! let manager = Arc::new(KvCacheManager::new(
//!     Arc::new(MemoryKvStore::new()),
//!     vec!["users".to_string()],
//!     None,
//! ));
//! let registry = CacheRegistry::new(manager);
//! let users = registry.cache("users")?;
//! # Ok::<_, cachefall_cache::CacheError>(())
//! ```

mod error;
mod fallback;
mod handle;
mod kv;
mod manager;
mod registry;
#[cfg(test)]
mod testing;

pub use error::CacheError;
pub use fallback::FallbackCache;
pub use handle::CacheHandle;
pub use kv::{DynKeyValueStore, KeyValueStore, MemoryKvStore, RedisKvStore};
pub use manager::{CacheManager, DynCacheManager, KvCacheManager};
pub use registry::CacheRegistry;

/// Type alias for a cache result.
pub type CacheResult<T> = Result<T, CacheError>;

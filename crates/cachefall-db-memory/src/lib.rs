//! # cachefall-db-memory
//!
//! In-memory storage backend for the cachefall service.
//!
//! This backend implements [`cachefall_storage::UserStore`] over a concurrent
//! hash map. It exists so the service runs with zero external infrastructure
//! (the original deployment used an embedded demo database for the same
//! purpose) and so tests have a fast, deterministic store.

mod storage;

pub use storage::InMemoryUserStore;

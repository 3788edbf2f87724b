//! Test doubles shared by the crate's unit tests.

use async_trait::async_trait;
use std::time::Duration;

use crate::CacheResult;
use crate::error::CacheError;
use crate::kv::KeyValueStore;

/// A key-value store whose every operation fails with a connection error.
///
/// Stands in for an unreachable Redis tier in fallback-policy tests.
pub(crate) struct FailingKvStore;

#[async_trait]
impl KeyValueStore for FailingKvStore {
    async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        Err(CacheError::connection("simulated outage"))
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Option<Duration>) -> CacheResult<()> {
        Err(CacheError::connection("simulated outage"))
    }

    async fn delete(&self, _key: &str) -> CacheResult<bool> {
        Err(CacheError::connection("simulated outage"))
    }

    async fn clear_prefix(&self, _prefix: &str) -> CacheResult<u64> {
        Err(CacheError::connection("simulated outage"))
    }

    async fn ping(&self) -> CacheResult<()> {
        Err(CacheError::connection("simulated outage"))
    }

    fn store_name(&self) -> &'static str {
        "failing"
    }
}

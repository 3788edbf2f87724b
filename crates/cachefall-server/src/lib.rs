pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;
pub mod service;

use std::sync::Arc;
use std::time::Duration;

use cachefall_cache::{
    CacheRegistry, DynCacheManager, DynKeyValueStore, KvCacheManager, MemoryKvStore, RedisKvStore,
};
use cachefall_db_memory::InMemoryUserStore;
use cachefall_storage::{DynUserStore, UserStore};

pub use config::{AppConfig, CacheConfig, LoggingConfig, RedisConfig, ServerConfig};
pub use observability::{apply_logging_level, init_tracing};
pub use server::{AppState, build_app, serve};
pub use service::{USERS_CACHE, UserService};

/// The key-value stores backing the two cache tiers, kept around for health
/// reporting.
pub struct CacheTiers {
    pub master: DynKeyValueStore,
    pub replica: Option<DynKeyValueStore>,
}

/// Creates the cache tier stores based on configuration.
///
/// ## Graceful degradation
///
/// With Redis disabled, or when the master pool cannot be created or
/// reached at startup, the master tier becomes a process-local in-memory
/// store and no replica is attached. A replica connection failure only
/// drops the replica tier.
pub async fn create_cache_tiers(config: &RedisConfig) -> CacheTiers {
    if !config.enabled {
        tracing::info!("Redis disabled, using in-process cache only");
        return CacheTiers {
            master: Arc::new(MemoryKvStore::new()),
            replica: None,
        };
    }

    tracing::info!(url = %config.url, "Connecting to Redis master");
    let Some(master_pool) = connect_redis(&config.url, config).await else {
        tracing::warn!("Failed to connect to Redis master, falling back to in-process cache");
        return CacheTiers {
            master: Arc::new(MemoryKvStore::new()),
            replica: None,
        };
    };

    let replica: Option<DynKeyValueStore> = match &config.replica_url {
        Some(url) => {
            tracing::info!(url = %url, "Connecting to Redis replica");
            match connect_redis(url, config).await {
                Some(pool) => Some(Arc::new(RedisKvStore::new(pool))),
                None => {
                    tracing::warn!("Failed to connect to Redis replica, running master-only");
                    None
                }
            }
        }
        None => None,
    };

    CacheTiers {
        master: Arc::new(RedisKvStore::new(master_pool)),
        replica,
    }
}

async fn connect_redis(url: &str, config: &RedisConfig) -> Option<deadpool_redis::Pool> {
    let timeout = Duration::from_millis(config.timeout_ms);
    let mut redis_config = deadpool_redis::Config::from_url(url);
    let mut pool_config = deadpool_redis::PoolConfig::new(config.pool_size);
    pool_config.timeouts.wait = Some(timeout);
    pool_config.timeouts.create = Some(timeout);
    pool_config.timeouts.recycle = Some(timeout);
    redis_config.pool = Some(pool_config);

    let pool = match redis_config.create_pool(Some(deadpool_redis::Runtime::Tokio1)) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to create Redis pool");
            return None;
        }
    };

    // Test the connection before committing to this tier
    match pool.get().await {
        Ok(_) => Some(pool),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to connect to Redis");
            None
        }
    }
}

/// Builds the cache registry over the tier stores.
pub fn create_cache_registry(tiers: &CacheTiers, config: &CacheConfig) -> CacheRegistry {
    let ttl = config.ttl();
    let primary: DynCacheManager = Arc::new(KvCacheManager::new(
        tiers.master.clone(),
        config.names.iter().cloned(),
        ttl,
    ));
    match &tiers.replica {
        Some(replica) => {
            let secondary: DynCacheManager = Arc::new(KvCacheManager::new(
                replica.clone(),
                config.names.iter().cloned(),
                ttl,
            ));
            CacheRegistry::with_secondary(primary, secondary)
        }
        None => CacheRegistry::new(primary),
    }
}

/// Wires up the full application state from configuration.
pub async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let tiers = Arc::new(create_cache_tiers(&config.redis).await);
    let registry = Arc::new(create_cache_registry(&tiers, &config.cache));
    let users_cache = registry.cache(USERS_CACHE)?;

    let store: DynUserStore = Arc::new(InMemoryUserStore::new());
    tracing::info!(backend = store.backend_name(), "user store initialized");

    let users = Arc::new(UserService::new(store, users_cache));
    Ok(AppState {
        users,
        registry,
        tiers,
    })
}

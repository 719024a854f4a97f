//! Redis counter storage.
//!
//! Each counter is a hash with `seq` and `updated_at` fields. An increment is
//! one `MULTI`/`EXEC` transaction of `HINCRBY` and `HSET`; Redis executes it
//! atomically, creating the hash on first use.

use async_trait::async_trait;
use deadpool_redis::redis;
use deadpool_redis::{Config, Pool, PoolConfig, Runtime, Timeouts};
use tracing::debug;

use crate::config::RedisStorageConfig;
use crate::domain::CounterKey;
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::CounterStore;

/// Redis-backed counter store.
pub struct RedisCounterStore {
    pool: Pool,
    namespace: String,
}

impl RedisCounterStore {
    /// Create a store with a connection pool for `config.url`.
    ///
    /// Connections are opened lazily; call `health_check` to verify the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be built from the configuration.
    pub fn new(config: &RedisStorageConfig) -> StorageResult<Self> {
        let timeout = Some(config.connect_timeout());
        let mut pool_config = PoolConfig::new(config.pool_size as usize);
        pool_config.timeouts = Timeouts {
            wait: timeout,
            create: timeout,
            recycle: timeout,
        };

        let mut cfg = Config::from_url(config.url.clone());
        cfg.pool = Some(pool_config);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            namespace: config.namespace.clone(),
        })
    }

    /// Physical Redis key of a counter.
    ///
    /// The tenant is length-prefixed, so a tenant containing `:` can never
    /// produce the key of another tenant/class pair.
    fn redis_key(&self, key: &CounterKey) -> String {
        let tenant = key.tenant.as_str();
        format!(
            "{}:{}:{}:{}",
            self.namespace,
            tenant.len(),
            tenant,
            key.class.as_str()
        )
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(&self, key: &CounterKey) -> StorageResult<u64> {
        let redis_key = self.redis_key(key);
        let mut conn = self.pool.get().await?;

        let (seq,): (u64,) = redis::pipe()
            .atomic()
            .hincr(&redis_key, "seq", 1)
            .hset(&redis_key, "updated_at", chrono::Utc::now().timestamp_millis())
            .ignore()
            .query_async(&mut conn)
            .await?;

        debug!(key = %redis_key, seq, "Counter incremented");
        Ok(seq)
    }

    async fn current(&self, key: &CounterKey) -> StorageResult<Option<u64>> {
        let redis_key = self.redis_key(key);
        let mut conn = self.pool.get().await?;

        let seq: Option<u64> = redis::cmd("HGET")
            .arg(&redis_key)
            .arg("seq")
            .query_async(&mut conn)
            .await?;

        Ok(seq)
    }

    async fn health_check(&self) -> StorageResult<()> {
        let mut conn = self.pool.get().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(StorageError::Unavailable)
        }
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

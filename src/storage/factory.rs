//! Storage backend factory.
//!
//! Creates the appropriate counter store based on configuration.

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::StorageResult;
use crate::storage::file::FileCounterStore;
use crate::storage::mysql::MySqlCounterStore;
use crate::storage::postgres::PostgresCounterStore;
use crate::storage::redis::RedisCounterStore;
use crate::storage::traits::CounterStore;

/// Create a counter store based on configuration.
///
/// The store is health-checked before it is returned, so a worker never
/// starts serving against an unreachable backend.
///
/// # Errors
///
/// Returns an error if the storage backend cannot be initialized or fails
/// its health check.
pub async fn create_store(config: &StorageConfig) -> StorageResult<Arc<dyn CounterStore>> {
    let store: Arc<dyn CounterStore> = match config.backend {
        StorageBackend::File => Arc::new(FileCounterStore::new(&config.file)?),
        StorageBackend::Redis => Arc::new(RedisCounterStore::new(&config.redis)?),
        StorageBackend::MySQL => Arc::new(MySqlCounterStore::connect(&config.mysql).await?),
        StorageBackend::PostgreSQL => {
            Arc::new(PostgresCounterStore::connect(&config.postgresql).await?)
        }
    };

    store.health_check().await?;

    Ok(store)
}

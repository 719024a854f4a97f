//! `MySQL` counter storage.
//!
//! `MySQL` has no `RETURNING`, so the increment uses `LAST_INSERT_ID(expr)`:
//! the upsert stores the new value through `LAST_INSERT_ID`, and the server
//! reports it back in the same statement's OK packet. No second query runs, so
//! the value cannot be confused with another connection's increment.

use async_trait::async_trait;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

use crate::config::SqlStorageConfig;
use crate::domain::CounterKey;
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::CounterStore;

const CREATE_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS sequence_counters (
    tenant_id      VARCHAR(64)     NOT NULL,
    sequence_class VARCHAR(32)     NOT NULL,
    seq            BIGINT UNSIGNED NOT NULL,
    updated_at     DATETIME(3)     NOT NULL,
    PRIMARY KEY (tenant_id, sequence_class)
) CHARACTER SET utf8mb4 COLLATE utf8mb4_bin";

const INCREMENT: &str = "\
INSERT INTO sequence_counters (tenant_id, sequence_class, seq, updated_at)
VALUES (?, ?, LAST_INSERT_ID(1), ?)
ON DUPLICATE KEY UPDATE seq = LAST_INSERT_ID(seq + 1), updated_at = VALUES(updated_at)";

const CURRENT: &str = "\
SELECT seq FROM sequence_counters WHERE tenant_id = ? AND sequence_class = ?";

/// `MySQL`-backed counter store.
pub struct MySqlCounterStore {
    pool: MySqlPool,
}

impl MySqlCounterStore {
    /// Connect and make sure the counter table exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable or the table cannot be created.
    pub async fn connect(config: &SqlStorageConfig) -> StorageResult<Self> {
        let pool = MySqlPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .connect(&config.url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let store = Self::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Wrap an existing pool. The caller is responsible for `migrate`.
    #[must_use]
    pub const fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Create the counter table if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL statement fails.
    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl CounterStore for MySqlCounterStore {
    async fn increment(&self, key: &CounterKey) -> StorageResult<u64> {
        let result = sqlx::query(INCREMENT)
            .bind(key.tenant.as_str())
            .bind(key.class.as_str())
            .bind(chrono::Utc::now())
            .execute(&self.pool)
            .await?;

        match result.last_insert_id() {
            0 => Err(StorageError::Query(
                "upsert did not report the incremented value".to_string(),
            )),
            seq => Ok(seq),
        }
    }

    async fn current(&self, key: &CounterKey) -> StorageResult<Option<u64>> {
        let seq: Option<u64> = sqlx::query_scalar(CURRENT)
            .bind(key.tenant.as_str())
            .bind(key.class.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(seq)
    }

    async fn health_check(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mysql"
    }
}

//! `PostgreSQL` counter storage.
//!
//! The increment is one `INSERT .. ON CONFLICT DO UPDATE .. RETURNING`
//! statement. `PostgreSQL` row-locks the conflicting row for the duration of
//! the statement, so concurrent upserts on one key are serialized and each
//! returns its own post-increment value.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::SqlStorageConfig;
use crate::domain::CounterKey;
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::CounterStore;

const CREATE_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS sequence_counters (
    tenant_id      TEXT        NOT NULL,
    sequence_class TEXT        NOT NULL,
    seq            BIGINT      NOT NULL CHECK (seq >= 0),
    updated_at     TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (tenant_id, sequence_class)
)";

const INCREMENT: &str = "\
INSERT INTO sequence_counters (tenant_id, sequence_class, seq, updated_at)
VALUES ($1, $2, 1, $3)
ON CONFLICT (tenant_id, sequence_class)
DO UPDATE SET seq = sequence_counters.seq + 1, updated_at = EXCLUDED.updated_at
RETURNING seq";

const CURRENT: &str = "\
SELECT seq FROM sequence_counters WHERE tenant_id = $1 AND sequence_class = $2";

/// `PostgreSQL`-backed counter store.
pub struct PostgresCounterStore {
    pool: PgPool,
}

impl PostgresCounterStore {
    /// Connect and make sure the counter table exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable or the table cannot be created.
    pub async fn connect(config: &SqlStorageConfig) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
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
    pub const fn from_pool(pool: PgPool) -> Self {
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

fn to_seq(value: i64) -> StorageResult<u64> {
    u64::try_from(value)
        .map_err(|_| StorageError::Serialization(format!("negative counter value {value}")))
}

#[async_trait]
impl CounterStore for PostgresCounterStore {
    async fn increment(&self, key: &CounterKey) -> StorageResult<u64> {
        let seq: i64 = sqlx::query_scalar(INCREMENT)
            .bind(key.tenant.as_str())
            .bind(key.class.as_str())
            .bind(chrono::Utc::now())
            .fetch_one(&self.pool)
            .await?;
        to_seq(seq)
    }

    async fn current(&self, key: &CounterKey) -> StorageResult<Option<u64>> {
        let seq: Option<i64> = sqlx::query_scalar(CURRENT)
            .bind(key.tenant.as_str())
            .bind(key.class.as_str())
            .fetch_optional(&self.pool)
            .await?;
        seq.map(to_seq).transpose()
    }

    async fn health_check(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgresql"
    }
}

//! In-process counter store.
//!
//! Counters live in a sharded concurrent map and vanish with the process. Use
//! it for embedding the service in tests or single-process tools; it is not
//! selectable from configuration.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{CounterKey, CounterRecord};
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::CounterStore;

/// Memory-backed counter store.
#[derive(Default)]
pub struct MemoryCounterStore {
    counters: DashMap<CounterKey, CounterRecord>,
}

impl MemoryCounterStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of counters created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Whether no counter has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &CounterKey) -> StorageResult<u64> {
        // The entry guard holds the shard write lock for the whole update
        let mut record = self
            .counters
            .entry(key.clone())
            .or_insert_with(|| CounterRecord::new(key.clone()));

        record
            .advance()
            .ok_or_else(|| StorageError::Rejected(format!("counter {key} overflowed")))
    }

    async fn current(&self, key: &CounterKey) -> StorageResult<Option<u64>> {
        Ok(self.counters.get(key).map(|record| record.seq))
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

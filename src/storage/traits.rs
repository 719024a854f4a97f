//! Storage trait definitions.
//!
//! These traits define the interface for storage backends, enabling swapping
//! between different implementations without changing business logic.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::CounterKey;
use crate::error::{StorageError, StorageResult};

/// Durable per-key counters.
///
/// Every implementation must make `increment` a single atomic
/// find-or-create, increment and fetch. Concurrent callers on the same key,
/// in this process or any other process sharing the store, must never observe
/// the same value. A call that returns an error before the store committed
/// must leave the counter untouched.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increment the counter for `key` and return the new value.
    ///
    /// A key that has never been used is created with value 0 and incremented,
    /// so the first call returns 1.
    async fn increment(&self, key: &CounterKey) -> StorageResult<u64>;

    /// Increment with a deadline of `timeout` for the whole round-trip.
    ///
    /// The default abandons the wait for a reply once the deadline passes, so
    /// a remote store may still have committed the increment. Stores that can
    /// decide before their commit point override this and guarantee that a
    /// `Timeout` error left the counter untouched.
    async fn increment_within(&self, key: &CounterKey, timeout: Duration) -> StorageResult<u64> {
        within(timeout, self.increment(key)).await
    }

    /// Read the last committed value without modifying anything.
    ///
    /// Returns `None` if the key has never been incremented.
    async fn current(&self, key: &CounterKey) -> StorageResult<Option<u64>>;

    /// Check if the storage backend is healthy and reachable.
    async fn health_check(&self) -> StorageResult<()>;

    /// Get the storage backend name.
    fn backend_name(&self) -> &'static str;
}

/// Run a store operation, failing with `StorageError::Timeout` after `timeout`.
pub async fn within<T>(
    timeout: Duration,
    op: impl Future<Output = StorageResult<T>>,
) -> StorageResult<T> {
    tokio::time::timeout(timeout, op)
        .await
        .map_err(|_| StorageError::timeout(timeout))?
}

//! Transaction sequence service.
//!
//! Issues identifiers such as `SAL-000042` per tenant and sequence class. The
//! service keeps no counter state of its own: every call is one atomic
//! increment in the configured store, and the prefix/padding is applied to the
//! committed value afterwards.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::SequenceConfig;
use crate::domain::{CounterKey, FormattedId};
use crate::error::{Result, SequenceError, StorageResult};
use crate::storage::traits::{CounterStore, within};

/// Service issuing per-tenant transaction numbers.
pub struct SequenceService {
    /// Durable counter store.
    store: Arc<dyn CounterStore>,
    /// Deadline for one store round-trip.
    timeout: Duration,
}

impl SequenceService {
    /// Create a new sequence service.
    pub fn new(store: Arc<dyn CounterStore>, config: &SequenceConfig) -> Self {
        Self {
            store,
            timeout: config.store_timeout(),
        }
    }

    /// Issue the next identifier for `(tenant, class)`.
    ///
    /// Unknown classes are accepted and numbered under the `TXN` prefix. No
    /// retry is attempted; a failed call may be retried by the caller and will
    /// receive whatever value is next at that time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if tenant or class is empty or malformed, and
    /// `StoreUnavailable` if the store did not acknowledge the increment.
    pub async fn next(&self, tenant: &str, class: &str) -> Result<FormattedId> {
        let key = Self::key(tenant, class)?;
        self.next_for(&key).await
    }

    /// Issue the next identifier for an already validated key.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the store did not acknowledge the increment.
    pub async fn next_for(&self, key: &CounterKey) -> Result<FormattedId> {
        let seq = self
            .timed(self.store.increment_within(key, self.timeout))
            .await
            .map_err(SequenceError::from)
            .inspect_err(|e| {
                warn!(%key, backend = self.store.backend_name(), error = %e, "Sequence increment failed");
                Self::record_failure(e);
            })?;

        let id = FormattedId::new(&key.class, seq);
        debug!(%key, %id, "Sequence issued");
        metrics::counter!("pos_sequencer_issued_total", "class" => key.class.to_string())
            .increment(1);

        Ok(id)
    }

    /// Last value issued for `(tenant, class)`, `None` if nothing was issued.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for a malformed key and `StoreUnavailable` if the
    /// store cannot be read.
    pub async fn current(&self, tenant: &str, class: &str) -> Result<Option<u64>> {
        let key = Self::key(tenant, class)?;
        let seq = self.timed(within(self.timeout, self.store.current(&key))).await?;
        Ok(seq)
    }

    /// Name of the backing store.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    fn key(tenant: &str, class: &str) -> Result<CounterKey> {
        CounterKey::parse(tenant, class)
            .map_err(SequenceError::InvalidKey)
            .inspect_err(Self::record_failure)
    }

    fn record_failure(error: &SequenceError) {
        metrics::counter!("pos_sequencer_failures_total", "kind" => error.kind()).increment(1);
    }

    /// Record the latency of one store round-trip.
    async fn timed<T>(&self, op: impl Future<Output = StorageResult<T>>) -> StorageResult<T> {
        let started = Instant::now();
        let result = op.await;

        metrics::histogram!("pos_sequencer_store_seconds", "backend" => self.store.backend_name())
            .record(started.elapsed().as_secs_f64());

        result
    }
}

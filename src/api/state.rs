//! Application state for Axum handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::AppConfig;
use crate::service::SequenceService;
use crate::storage::traits::CounterStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Counter store.
    pub store: Arc<dyn CounterStore>,
    /// Sequence service.
    pub sequence_service: Arc<SequenceService>,
    /// Prometheus exposition handle, `None` when metrics are disabled.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn CounterStore>) -> Self {
        let sequence_service = Arc::new(SequenceService::new(
            Arc::clone(&store),
            &config.sequence,
        ));

        Self {
            config,
            store,
            sequence_service,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

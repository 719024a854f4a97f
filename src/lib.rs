//! # POS Sequencer
//!
//! Durable, human-readable transaction numbers for a multi-tenant point-of-sale
//! backend. Each `(tenant, sequence class)` pair owns an independent counter;
//! [`SequenceService::next`](service::SequenceService::next) increments it
//! atomically in a shared store and formats the result:
//!
//! ```text
//! next("pharmacy-1", "sale")     -> SAL-000001
//! next("pharmacy-1", "sale")     -> SAL-000002
//! next("pharmacy-1", "purchase") -> PUR-000001
//! next("pharmacy-1", "refund")   -> TXN-000001
//! ```
//!
//! No counter value is cached in process memory, so any number of workers on
//! any number of hosts can share one store without ever issuing a duplicate.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          Sequencer Worker                            │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌────────────┐ │
//! │  │   API Layer │  │  Sequence   │  │   Counter   │  │  Domain    │ │
//! │  │  (Axum)     │→ │  Service    │→ │   Stores    │  │  Models    │ │
//! │  └─────────────┘  └─────────────┘  └─────────────┘  └────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::create_router;
use crate::api::state::AppState;
use crate::config::AppConfig;
use crate::storage::create_store;

/// Run the sequencer worker service.
///
/// This function:
/// 1. Loads configuration from files and environment
/// 2. Initializes logging and metrics
/// 3. Connects the counter store
/// 4. Starts the HTTP server
/// 5. Handles graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded
/// - The counter store fails to initialize
/// - HTTP server fails to bind
pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    init_logging(&config);

    let instance_id = Uuid::new_v4();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        %instance_id,
        "Starting POS sequencer"
    );

    let store = create_store(&config.storage).await?;
    info!(backend = store.backend_name(), "Counter store initialized");

    let mut state = AppState::new(Arc::new(config.clone()), store);
    if config.observability.metrics_enabled {
        let handle = PrometheusBuilder::new().install_recorder()?;
        state = state.with_metrics(handle);
    }

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(%instance_id, "Server shutdown complete");
    Ok(())
}

/// Initialize logging based on configuration.
fn init_logging(config: &AppConfig) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.observability.log_format == "json" {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

//! Router setup and configuration.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{health, sequence};
use crate::api::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    // Health and metrics routes
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/metrics", get(health::metrics));

    // Sequence routes
    let sequence_routes = Router::new()
        .route("/next", post(sequence::next))
        .route("/current", get(sequence::current));

    Router::new()
        .merge(health_routes)
        .nest("/v1/sequence", sequence_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Router construction.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Health check (intentionally unauthenticated for load balancers)
        .route("/health", get(handlers::health_check))
        // Upload intake and lifecycle
        .route("/uploads", post(handlers::upload))
        .route("/uploads/{uuid}/done", post(handlers::finalize_upload))
        .route("/uploads/{uuid}", delete(handlers::delete_upload));

    let mut router = Router::new().merge(api_routes);

    // Conditionally add metrics endpoint based on config.
    if state.config.server.metrics_enabled {
        router = router.merge(Router::new().route("/metrics", get(metrics_handler)));
    }

    router
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! API Routes
//!
//! Configures the Axum router serving the peer protocol and diagnostics.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, peer_handler, stats_handler, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET {base_path}/{group}/{key}` - Raw value bytes for peers
/// - `GET /stats/:group` - Group statistics
/// - `GET /health` - Health check endpoint
///
/// The peer protocol is served from the fallback so that malformed paths
/// under the base path still receive a 400 rather than a routing 404.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/stats/:group", get(stats_handler))
        .route("/health", get(health_handler))
        .fallback(peer_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

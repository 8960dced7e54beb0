//! Axum router construction.
//!
//! Assembles the `WebSocket` stream and the REST routes into a single
//! [`Router`] with CORS enabled for browser viewers.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete router.
///
/// - `GET /ws/board` -- viewport update stream
/// - `GET /api/status` -- generation, population, subscribers
/// - `GET /api/patterns` -- seeding catalog
/// - `GET /api/patterns/{name}` -- one catalog pattern
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws/board", get(ws::ws_board))
        .route("/api/status", get(handlers::get_status))
        .route("/api/patterns", get(handlers::list_patterns))
        .route("/api/patterns/{name}", get(handlers::get_pattern))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! HTTP router construction.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::state::AppState;

/// Build the application router: `POST /` for queries, `GET /health` for probes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(api::query))
        .route("/health", get(api::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

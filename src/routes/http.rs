// GET handlers: version, dashboard snapshot, aggregates

use axum::{extract::State, response::IntoResponse};

use super::AppState;
use crate::version::{NAME, VERSION};

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/dashboard — window and aggregates from one consistent read.
pub(super) async fn dashboard_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(state.store.snapshot().await)
}

/// GET /api/stats
pub(super) async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(state.store.current_aggregates().await)
}

// HTTP + WebSocket read API over the dashboard store

mod http;
mod ws;

use axum::{Router, routing::get};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tower_http::cors::{Any, CorsLayer};

use crate::store::DashboardStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<DashboardStore>,
    pub(crate) ws_clients: Arc<AtomicUsize>,
}

pub fn app(store: Arc<DashboardStore>, ws_clients: Arc<AtomicUsize>) -> Router {
    let state = AppState { store, ws_clients };
    Router::new()
        .route("/", get(|| async { "trafficdash: live request monitor" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/dashboard", get(http::dashboard_handler)) // GET /api/dashboard
        .route("/api/stats", get(http::stats_handler)) // GET /api/stats
        .route("/ws/dashboard", get(ws::ws_dashboard)) // WS /ws/dashboard
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

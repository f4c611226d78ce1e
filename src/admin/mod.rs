//! Operational endpoints: scrape, liveness, readiness.

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router() -> Router<AppState> {
    Router::new()
        .route("/metrics", get(get_metrics))
        .route("/healthz", get(get_healthz))
        .route("/readyz", get(get_readyz))
        .route("/toggle-ready", post(toggle_ready))
}

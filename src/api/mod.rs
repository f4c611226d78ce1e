//! Demo application endpoints.

pub mod client_logs;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use self::client_logs::ingest_client_log;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_api_router() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/hello", get(hello))
        .route("/api/slow", get(slow))
        .route("/api/error", get(fail))
        .route("/api/calc", get(calc))
        .route("/client-logs", post(ingest_client_log))
}

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::health::ReadinessStatus;
use crate::http::server::AppState;
use crate::observability::metrics::CONTENT_TYPE;

#[derive(Debug, Serialize)]
pub struct ProbeStatus {
    pub status: &'static str,
}

impl From<ReadinessStatus> for ProbeStatus {
    fn from(status: ReadinessStatus) -> Self {
        Self {
            status: status.as_str(),
        }
    }
}

pub async fn get_metrics(State(state): State<AppState>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], state.metrics.render())
}

pub async fn get_healthz() -> Json<ProbeStatus> {
    Json(ProbeStatus { status: "OK" })
}

pub async fn get_readyz(State(state): State<AppState>) -> (StatusCode, Json<ProbeStatus>) {
    let status = state.readiness.status();
    let code = match status {
        ReadinessStatus::Ready => StatusCode::OK,
        ReadinessStatus::NotReady => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(status.into()))
}

pub async fn toggle_ready(State(state): State<AppState>) -> Json<ProbeStatus> {
    let status = state.readiness.toggle();
    tracing::info!(
        ready = status == ReadinessStatus::Ready,
        "Readiness toggled to: {}",
        status.as_str()
    );
    Json(status.into())
}

//! Demo endpoints exercised by the observability pipeline.

use std::time::Duration;

use axum::{
    extract::{
        rejection::QueryRejection,
        Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::extract::LenientJson;
use crate::http::request::CorrelationId;
use crate::http::response::AppError;
use crate::http::server::AppState;

pub const DEMO_USERNAME: &str = "admin";
pub const DEMO_PASSWORD: &str = "1234";
pub const DEMO_TOKEN: &str = "fake-token";

pub const SLOW_DELAY: Duration = Duration::from_millis(700);

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HelloResponse {
    pub message: &'static str,
    pub cid: String,
}

#[derive(Debug, Deserialize)]
pub struct CalcParams {
    pub a: Option<String>,
    pub b: Option<String>,
    /// Accepted and logged; the endpoint always adds.
    pub op: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CalcResponse {
    pub result: Value,
}

pub async fn login(
    State(state): State<AppState>,
    LenientJson(credentials): LenientJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    if credentials.username.as_deref() == Some(DEMO_USERNAME)
        && credentials.password.as_deref() == Some(DEMO_PASSWORD)
    {
        return Ok(Json(TokenResponse { token: DEMO_TOKEN }));
    }

    state.metrics.inc_login_error();
    tracing::warn!(user = credentials.username.as_deref(), "Login failed");
    Err(AppError::unauthorized("Invalid credentials"))
}

pub async fn hello(correlation_id: CorrelationId) -> Json<HelloResponse> {
    tracing::info!("Hello endpoint called");
    Json(HelloResponse {
        message: "Hello World",
        cid: correlation_id.to_string(),
    })
}

pub async fn slow() -> Json<MessageResponse> {
    tokio::time::sleep(SLOW_DELAY).await;

    let delay_ms = SLOW_DELAY.as_millis() as u64;
    tracing::warn!(duration = delay_ms, "Slow endpoint called");
    Json(MessageResponse {
        message: format!("Slow response after {}ms", delay_ms),
    })
}

pub async fn fail() -> Result<Json<MessageResponse>, AppError> {
    Err(AppError::internal("Simulated Backend Failure"))
}

pub async fn calc(
    query: Result<Query<CalcParams>, QueryRejection>,
) -> Result<Json<CalcResponse>, AppError> {
    let Query(params) = query.map_err(|e| AppError::bad_request(e.body_text()))?;
    tracing::info!(
        a = params.a.as_deref(),
        b = params.b.as_deref(),
        op = params.op.as_deref(),
        "Calculation requested"
    );

    let present = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_owned);
    let (Some(a), Some(b)) = (present(&params.a), present(&params.b)) else {
        return Err(AppError::bad_request("Missing params"));
    };

    let sum = parse_operand(&a)? + parse_operand(&b)?;
    Ok(Json(CalcResponse {
        result: number_value(sum),
    }))
}

fn parse_operand(raw: &str) -> Result<f64, AppError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::bad_request("Invalid params"))
}

/// Integral values serialize without a fractional part (`5`, not `5.0`).
/// Non-finite values become `null`.
fn number_value(v: f64) -> Value {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if v.fract() == 0.0 && v.abs() <= MAX_SAFE_INTEGER {
        Value::from(v as i64)
    } else {
        Value::from(v)
    }
}

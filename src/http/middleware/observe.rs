//! Access logging and request metrics.
//!
//! [`track_requests`] wraps the whole router. It opens the `request` span
//! carrying the correlation ID, and once the response is produced it records
//! exactly one metrics observation and one access-log record.
//!
//! The matched route pattern is only known inside the router, so
//! [`stamp_matched_route`] (a route layer) copies it onto the response for the
//! outer layer to read. Unmatched requests are labelled with their raw path.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::header::CONTENT_LENGTH;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;

use crate::http::request::CorrelationId;
use crate::http::server::AppState;

/// Route pattern that served a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute(pub String);

pub async fn stamp_matched_route(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| MatchedRoute(path.as_str().to_owned()));

    let mut response = next.run(request).await;
    if let Some(route) = route {
        response.extensions_mut().insert(route);
    }
    response
}

pub async fn track_requests(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let url = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| path.clone());

    let correlation_id = CorrelationId::from_request(request.extensions(), request.headers());
    request.extensions_mut().insert(correlation_id.clone());

    let span = tracing::info_span!(
        "request",
        correlation_id = %correlation_id,
        method = %method,
        path = %path,
    );

    async move {
        tracing::debug!(url = %url, "Request received");

        let response = next.run(request).await;

        let status = response.status().as_u16();
        let elapsed = start.elapsed();
        let route = response
            .extensions()
            .get::<MatchedRoute>()
            .map(|route| route.0.as_str())
            .unwrap_or(&path);

        state
            .metrics
            .record_request(method.as_str(), route, status, elapsed.as_secs_f64());

        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");
        tracing::info!(
            method = %method,
            url = %url,
            route = %route,
            status,
            content_length,
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            "HTTP Request"
        );

        response
    }
    .instrument(span)
    .await
}

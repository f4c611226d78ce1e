//! Request correlation.
//!
//! # Responsibilities
//! - Generate a correlation ID (UUID v4) for requests that arrive without one
//! - Adopt the caller's `x-request-id` when present
//! - Expose the ID to handlers through the [`CorrelationId`] extractor
//!
//! # Design Decisions
//! - The ID is assigned by the outermost layer, before anything else runs
//! - A blank incoming `x-request-id` counts as absent and gets a fresh ID
//! - An ID that cannot be produced or read degrades to [`UNKNOWN_CORRELATION_ID`]

use std::convert::Infallible;
use std::fmt;

use axum::extract::{FromRequestParts, Request as AxumRequest};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the correlation ID in both directions.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Sentinel used when no usable ID exists.
pub const UNKNOWN_CORRELATION_ID: &str = "unknown";

/// Generates a fresh UUID v4 for each request lacking an `x-request-id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeCorrelationId;

impl MakeRequestId for MakeCorrelationId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        let value = HeaderValue::from_str(&id)
            .unwrap_or_else(|_| HeaderValue::from_static(UNKNOWN_CORRELATION_ID));
        Some(RequestId::new(value))
    }
}

/// Remove a blank `x-request-id` so the request is treated as having none.
pub async fn drop_blank_correlation_id(mut request: AxumRequest) -> AxumRequest {
    let blank = request
        .headers()
        .get_all(&X_REQUEST_ID)
        .iter()
        .all(|value| value.as_bytes().iter().all(u8::is_ascii_whitespace));
    if blank {
        request.headers_mut().remove(&X_REQUEST_ID);
    }
    request
}

/// Correlation ID of the request being served.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_CORRELATION_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve the ID from request state: an already resolved value, the
    /// `RequestId` extension, then the raw header.
    pub fn from_request(extensions: &Extensions, headers: &HeaderMap) -> Self {
        if let Some(id) = extensions.get::<CorrelationId>() {
            return id.clone();
        }

        extensions
            .get::<RequestId>()
            .map(RequestId::header_value)
            .or_else(|| headers.get(&X_REQUEST_ID))
            .and_then(|value| value.to_str().ok())
            .filter(|id| !id.is_empty())
            .map(Self::new)
            .unwrap_or_else(Self::unknown)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_request(&parts.extensions, &parts.headers))
    }
}

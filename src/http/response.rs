//! Error classification and error responses.
//!
//! Every failure leaves the service as `{"error": <message>}`:
//! - `BadRequest` → 400, `Unauthorized` → 401: client input, logged at debug
//! - `Internal` → 500: logged at error level with its captured stack
//! - panics: caught by the pipeline and answered like `Internal`

use std::any::Any;
use std::backtrace::Backtrace;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::observability::crash::panic_message;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{message}")]
    Internal { message: String, stack: String },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// An internal fault, capturing the current stack for the log.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            stack: Backtrace::force_capture().to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal { message, stack } => {
                tracing::error!(stack = %stack, "{}", message);
            }
            other => {
                tracing::debug!(status = status.as_u16(), error = %other, "Request rejected");
            }
        }

        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// Response for a handler that panicked.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(&*payload);
    // The stack was already written to exceptions.log by the panic hook.
    tracing::error!(panic = true, "{}", message);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody { error: message }),
    )
        .into_response()
}

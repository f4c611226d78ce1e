//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layer stack)
//!     → request.rs (assign or adopt correlation ID)
//!     → middleware/ (access log, metrics, headers)
//!     → extract.rs (lenient JSON bodies)
//!     → admin/ and api/ handlers
//!     → response.rs (typed errors → JSON error bodies)
//!     → Send to client
//! ```

pub mod extract;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use extract::LenientJson;
pub use request::{CorrelationId, MakeCorrelationId, UNKNOWN_CORRELATION_ID, X_REQUEST_ID};
pub use response::AppError;
pub use server::{AppState, HttpServer};

//! Observability demo service library.

pub mod admin;
pub mod api;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
pub use observability::HttpMetrics;

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file, PORT override)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → owned by HttpServer, read at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config, ConfigError};
pub use schema::AppConfig;
pub use schema::ListenerConfig;
pub use schema::LoggingConfig;
pub use schema::MetricsConfig;

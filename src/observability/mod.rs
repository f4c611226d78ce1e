//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, JSON records)
//!     → metrics.rs (counters, histograms, process gauges)
//!
//! Sinks:
//!     → rolling.rs (daily, size-capped, gzip-archived files)
//!     → console (human-readable)
//!     → crash.rs (panics and failed background tasks)
//!     → GET /metrics (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Correlation ID flows through every record via the request span
//! - Sink failures never reach request handling

pub mod crash;
pub mod logging;
pub mod metrics;
pub mod process;
pub mod rolling;

pub use crash::{spawn_supervised, CrashLog};
pub use logging::{init_logging, LoggingGuard};
pub use metrics::HttpMetrics;

//! Health and readiness.
//!
//! # Data Flow
//! ```text
//! GET  /healthz       → always OK while the process serves requests
//! GET  /readyz        → state.rs flag
//! POST /toggle-ready  → flips state.rs flag
//! ```
//!
//! # Design Decisions
//! - Liveness checks no dependencies
//! - Readiness is operator-controlled

pub mod state;

pub use state::{Readiness, ReadinessStatus};

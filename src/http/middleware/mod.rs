//! Cross-cutting request middleware.

pub mod observe;
pub mod security_headers;

pub use observe::{stamp_matched_route, track_requests, MatchedRoute};
pub use security_headers::security_headers;

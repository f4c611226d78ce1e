//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every endpoint
//! - Wire up middleware (correlation ID, access log + metrics, CORS,
//!   security headers, compression, panic catcher)
//! - Serve on a bound listener until shutdown is signalled
//!
//! # Layer Order (outermost first)
//! ```text
//! drop blank id → SetRequestId → PropagateRequestId → track_requests → CORS
//!     → security_headers → compression → body limit → router
//!         → stamp_matched_route → catch panic → handler
//! ```

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state, map_request},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
};

use crate::admin::setup_admin_router;
use crate::api::setup_api_router;
use crate::config::AppConfig;
use crate::health::Readiness;
use crate::http::middleware::{security_headers, stamp_matched_route, track_requests};
use crate::http::request::{drop_blank_correlation_id, MakeCorrelationId, X_REQUEST_ID};
use crate::http::response::panic_response;
use crate::observability::HttpMetrics;

/// Largest accepted JSON request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub metrics: HttpMetrics,
    pub readiness: Arc<Readiness>,
}

impl AppState {
    pub fn new(metrics: HttpMetrics) -> Self {
        Self {
            metrics,
            readiness: Arc::new(Readiness::default()),
        }
    }
}

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig, metrics: HttpMetrics) -> Self {
        let state = AppState::new(metrics);
        let router = Self::build_router(state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        let routes = Router::new()
            .merge(setup_admin_router())
            .merge(setup_api_router());
        Self::with_pipeline(routes, state)
    }

    /// Wrap `routes` in the request pipeline shared by every endpoint.
    pub fn with_pipeline(routes: Router<AppState>, state: AppState) -> Router {
        routes
            .route_layer(CatchPanicLayer::custom(panic_response))
            .route_layer(from_fn(stamp_matched_route))
            .layer(
                ServiceBuilder::new()
                    .layer(map_request(drop_blank_correlation_id))
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeCorrelationId))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(from_fn_with_state(state.clone(), track_requests))
                    .layer(CorsLayer::permissive())
                    .layer(from_fn(security_headers))
                    .layer(CompressionLayer::new())
                    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
            )
            .with_state(state)
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service = %self.config.logging.service_name,
            "Server running on port {}",
            addr.port()
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Shared state handed to handlers.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

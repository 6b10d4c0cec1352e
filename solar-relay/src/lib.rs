//! solar-relay library interface
//!
//! Exposes the router and state so integration tests can drive the relay
//! with a stub vision model.

pub mod api;
pub mod config;
pub mod error;
pub mod fallback;
pub mod service;
pub mod upstream;
pub mod verdict;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use solar_common::config::FallbackMode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::upstream::{UpstreamError, VisionModel};

/// Application state shared across handlers
///
/// Nothing here affects how a request is answered except `upstream` and
/// `fallback_mode`; the rest is diagnostics for /health.
#[derive(Clone)]
pub struct AppState {
    /// Vision model the relay forwards to
    pub upstream: Arc<dyn VisionModel>,
    /// What to answer when the vision model fails
    pub fallback_mode: FallbackMode,
    /// Overall request body ceiling in bytes
    pub max_body_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last upstream error, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
    /// Upstream failures since startup
    pub upstream_failures: Arc<AtomicU64>,
    /// Canned verdicts served since startup
    pub fallbacks_served: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(
        upstream: Arc<dyn VisionModel>,
        fallback_mode: FallbackMode,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            upstream,
            fallback_mode,
            max_body_bytes,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
            upstream_failures: Arc::new(AtomicU64::new(0)),
            fallbacks_served: Arc::new(AtomicU64::new(0)),
        }
    }

    pub(crate) async fn record_upstream_failure(&self, err: &UpstreamError) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
        *self.last_error.write().await = Some(format!("{}: {}", err.code(), err));
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::analyze_routes())
        .merge(api::health_routes())
        .route("/api/buildinfo", get(api::get_build_info))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Health check endpoint
//!
//! Uptime plus fallback diagnostics: a relay serving canned verdicts still
//! answers 200 on /analyze, so this is where it shows.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::Ordering;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" once the vision model has failed since startup
    pub status: String,
    /// Module name ("solar-relay")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Vision model identifier
    pub upstream: String,
    /// "canned" or "report"
    pub fallback_mode: String,
    pub upstream_failures: u64,
    pub fallbacks_served: u64,
    /// Last upstream error if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let last_error = state.last_error.read().await.clone();
    let upstream_failures = state.upstream_failures.load(Ordering::Relaxed);

    Json(HealthResponse {
        status: if upstream_failures == 0 { "ok" } else { "degraded" }.to_string(),
        module: "solar-relay".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        upstream: state.upstream.name().to_string(),
        fallback_mode: state.fallback_mode.to_string(),
        upstream_failures,
        fallbacks_served: state.fallbacks_served.load(Ordering::Relaxed),
        last_error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

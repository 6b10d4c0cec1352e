//! solar-relay - HTTP relay between review clients and the vision model
//!
//! Accepts a base64 rooftop image on POST /analyze, forwards it to Gemini
//! with the audit prompt, and answers with a verification result.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use solar_common::config::load_toml_config;
use solar_common::logging::init_tracing;
use solar_relay::api::BuildInfo;
use solar_relay::config::{RelayArgs, RelayConfig};
use solar_relay::upstream::GeminiClient;
use solar_relay::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; a missing file is not an error
    let _ = dotenvy::dotenv();

    let args = RelayArgs::parse();
    let log = init_tracing().context("Failed to initialize logging")?;
    info!("Starting {}", BuildInfo::current());

    let toml = load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;
    let config = RelayConfig::resolve(&args, &toml).context("Invalid relay configuration")?;
    log.apply(&config.logging).context("Failed to apply log level")?;
    if log.is_env_override() {
        info!("RUST_LOG is set; ignoring configured log level");
    }

    let gemini = GeminiClient::new(
        config.api_key.clone(),
        config.model.clone(),
        config.gemini_base_url.clone(),
        config.upstream_timeout,
    )
    .context("Failed to create Gemini client")?;

    if !gemini.has_api_key() {
        warn!("GEMINI_API_KEY is not set; every analysis will fail upstream");
    }
    info!(
        model = %config.model,
        fallback_mode = %config.fallback_mode,
        max_body_bytes = config.max_body_bytes,
        upstream_timeout_secs = config.upstream_timeout.as_secs(),
        "Relay configured"
    );

    let state = AppState::new(Arc::new(gemini), config.fallback_mode, config.max_body_bytes);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("solar-relay listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

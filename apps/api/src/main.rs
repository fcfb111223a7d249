mod analysis;
mod config;
mod errors;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::service::AnalysisService;
use crate::config::Config;
use crate::llm_client::{mask_api_key, GeminiClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails only on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting VoiceMyIssue API v{}", env!("CARGO_PKG_VERSION"));

    // A missing key is not fatal: the first provider call fails instead.
    match &config.gemini_api_key {
        Some(key) => info!("Gemini API key loaded: {}", mask_api_key(key)),
        None => warn!("Missing GEMINI_API_KEY environment variable."),
    }

    // Initialize LLM client
    let llm = GeminiClient::new(
        config.gemini_api_key.clone(),
        &config.gemini_base_url,
        Duration::from_secs(config.gemini_timeout_secs),
    )
    .context("Failed to build Gemini HTTP client")?;

    let analysis = Arc::new(AnalysisService::new(
        Arc::new(llm.clone()),
        config.candidates.clone(),
    ));
    info!(
        "Analysis service initialized (candidates: {})",
        analysis.candidates()
    );
    if config.strict_integrity {
        info!("Strict integrity checks enabled");
    }

    // Build app state
    let state = AppState {
        config: config.clone(),
        llm,
        analysis,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

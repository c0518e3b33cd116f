mod config;
mod document;
mod errors;
mod jobs;
mod llm_client;
mod optimizer;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::optimizer::orchestrator::Orchestrator;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values, not on missing keys)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    for kind in &config.disabled_providers {
        warn!("{} is not set; provider '{}' is disabled", kind.api_key_var(), kind);
    }
    if config.providers.is_empty() {
        warn!("No providers configured; every optimization will fail with a configuration error");
    } else {
        info!(
            "Provider priority: {}",
            config
                .providers
                .iter()
                .map(|p| format!("{} ({})", p.kind, p.model))
                .collect::<Vec<_>>()
                .join(" -> ")
        );
    }

    // Initialize completion client and orchestrator
    let llm = LlmClient::new()?;
    let orchestrator = Orchestrator::new(Arc::new(llm), config.backoff);
    info!(
        "Retry backoff: base {}ms, max {}ms",
        config.backoff.base_delay.as_millis(),
        config.backoff.max_delay.as_millis()
    );

    let port = config.port;
    let state = AppState {
        config: Arc::new(config),
        orchestrator,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

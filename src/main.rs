mod audio;
mod auth;
mod chat;
mod config;
mod embeddings;
mod error;
mod generator;
mod handlers;
mod images;
mod metrics;
mod models;
mod registry;
mod router;
mod sse;
mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{Args, Settings};
use crate::generator::MockGenerator;
use crate::metrics::Metrics;
use crate::registry::ModelRegistry;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // parse cli arguments
    let args = Args::parse();
    let settings = Settings::from_args(&args)?;

    let metrics = Arc::new(Metrics::new().context("failed to register metrics")?);
    let state = Arc::new(AppState::new(
        ModelRegistry::new(settings.models.clone()),
        settings.api_keys.clone(),
        Arc::new(MockGenerator::new()),
        metrics.clone(),
    ));

    // periodic window report
    tokio::spawn(metrics::reporter(
        metrics,
        Duration::from_secs(settings.metrics_interval),
    ));

    let app = router::build(state.clone());

    let listener = tokio::net::TcpListener::bind(&settings.bind_address)
        .await
        .with_context(|| format!("failed to bind to {}", settings.bind_address))?;

    info!("Mock OpenAI API running on http://{}", settings.bind_address);
    info!(models = state.registry.all().len(), "Model registry loaded");
    if state.api_keys.is_empty() {
        info!("No API keys configured, authentication disabled");
    } else {
        info!(keys = state.api_keys.len(), "Bearer token authentication enabled");
    }

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

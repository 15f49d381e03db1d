// Main entry point - Dependency injection and console setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::load_app_config;
use crate::infrastructure::http_api::HttpTelemetryApi;
use crate::infrastructure::stream_client::StreamClient;
use crate::presentation::app_state::AppState;
use crate::presentation::console::Console;
use crate::presentation::handlers::Services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr, stdout belongs to the console
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = load_app_config()?;
    tracing::info!(base_url = %config.server.base_url, "Starting speedometer console");

    // Create API client (infrastructure layer)
    let api = Arc::new(HttpTelemetryApi::new(config.clone())?);
    if let Err(e) = api.check_health().await {
        tracing::warn!(error = %e, "Telemetry server health check failed");
    }

    let stream = StreamClient::new(config.stream_url(), config.stream.reconnect.clone());
    let services = Services {
        backend: api.clone(),
        history: api,
    };
    let state = AppState::new(
        config.simulator,
        config.history.hours,
        config.history.chart_width,
    );

    Console::new(state, services, stream).run().await
}

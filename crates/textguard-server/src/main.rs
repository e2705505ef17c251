//! TextGuard server binary

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use textguard_server::{initialize, run_server, telemetry, Cli, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing(cli.verbose, cli.log_json);

    info!("Starting TextGuard server");

    // Load configuration
    let config = ServerConfig::load(&cli.config, &cli)?;
    config.validate()?;
    info!("Configuration loaded successfully");
    info!("Backend: {}", config.classifier.backend);
    info!("Model: {}", config.classifier.model_id());

    let metrics_handle = if config.server.metrics {
        Some(telemetry::init_metrics()?)
    } else {
        None
    };

    // Load the classifier before binding; a failed load is fatal
    let state = match initialize(&config.classifier).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to load classifier. Exiting...");
            return Err(e.into());
        }
    };

    let state = match metrics_handle {
        Some(handle) => state.with_metrics(handle),
        None => state,
    };

    run_server(Arc::new(state), &config.server).await
}

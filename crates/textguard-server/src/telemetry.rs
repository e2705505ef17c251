//! Logging and metrics initialization

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter, overridden by `RUST_LOG`
const DEFAULT_FILTER: &str = "textguard=info,tower_http=warn";

const VERBOSE_FILTER: &str = "textguard=debug,tower_http=debug";

/// Initialize tracing/logging
pub fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    let json_layer = json.then(|| fmt::layer().json());
    let text_layer = (!json).then(fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

/// Install the Prometheus recorder and return the handle `/metrics` renders
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "textguard_requests_total",
        "Total number of requests by endpoint"
    );
    metrics::describe_counter!(
        "textguard_verdicts_total",
        "Total number of classification verdicts by label"
    );
    metrics::describe_counter!("textguard_errors_total", "Total number of errors by kind");
    metrics::describe_histogram!(
        "textguard_inference_latency_us",
        metrics::Unit::Microseconds,
        "Classifier latency in microseconds per request"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}

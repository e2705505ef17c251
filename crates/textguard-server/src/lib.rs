//! TextGuard Server
//!
//! HTTP service that labels submitted text as `toxic` or `safe` using a
//! pretrained classifier or a keyword fallback scorer.
//!
//! Endpoints:
//! - `GET /health`: liveness and classifier status
//! - `POST /analyze`: classify one text
//! - `POST /analyze-batch`: classify a list of texts in one provider call
//! - `GET /stats`: model identifier and endpoint map
//! - `GET /metrics`: Prometheus metrics, when enabled

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use app::{build_app, run_server};
pub use cli::Cli;
pub use config::{ServerConfig, ServerSettings};
pub use error::AppError;
pub use state::{initialize, AppState, ProviderPhase, ServiceState};

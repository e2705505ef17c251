//! Service state and the classifier startup sequence

use crate::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::fmt;
use std::sync::Arc;
use textguard_classifiers::{Analyzer, Backend, ClassifierConfig};
use textguard_core::{Error, Result};
use tracing::{error, info};

/// Shared handler state
pub type AppState = Arc<ServiceState>;

/// Classifier lifecycle: `Uninitialized -> Loading -> Ready | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderPhase {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

impl ProviderPhase {
    /// Whether `next` is a legal successor of this phase
    pub fn can_advance_to(self, next: ProviderPhase) -> bool {
        matches!(
            (self, next),
            (Self::Uninitialized, Self::Loading)
                | (Self::Loading, Self::Ready)
                | (Self::Loading, Self::Failed)
        )
    }
}

impl fmt::Display for ProviderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Immutable state built before the listener binds
pub struct ServiceState {
    phase: ProviderPhase,
    analyzer: Option<Analyzer>,
    model_id: String,
    metrics: Option<PrometheusHandle>,
}

impl ServiceState {
    /// State serving `analyzer`
    pub fn ready(analyzer: Analyzer, model_id: impl Into<String>) -> Self {
        Self {
            phase: ProviderPhase::Ready,
            analyzer: Some(analyzer),
            model_id: model_id.into(),
            metrics: None,
        }
    }

    /// State whose classifier has not finished loading
    pub fn loading(model_id: impl Into<String>) -> Self {
        Self {
            phase: ProviderPhase::Loading,
            analyzer: None,
            model_id: model_id.into(),
            metrics: None,
        }
    }

    /// Attach the Prometheus handle rendered by `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn phase(&self) -> ProviderPhase {
        self.phase
    }

    pub fn classifier_loaded(&self) -> bool {
        self.phase == ProviderPhase::Ready && self.analyzer.is_some()
    }

    /// The analyzer, or `ServiceUnavailable` while not ready
    pub fn analyzer(&self) -> std::result::Result<&Analyzer, AppError> {
        match (&self.phase, &self.analyzer) {
            (ProviderPhase::Ready, Some(analyzer)) => Ok(analyzer),
            _ => Err(AppError::not_loaded()),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn metrics(&self) -> Option<&PrometheusHandle> {
        self.metrics.as_ref()
    }
}

/// Tracks the startup phase and logs each transition
struct Startup {
    phase: ProviderPhase,
}

impl Startup {
    fn new() -> Self {
        Self {
            phase: ProviderPhase::Uninitialized,
        }
    }

    fn advance(&mut self, next: ProviderPhase) {
        debug_assert!(self.phase.can_advance_to(next), "{} -> {}", self.phase, next);
        info!("Classifier {} -> {}", self.phase, next);
        self.phase = next;
    }
}

/// Build the classifier selected by `config`.
///
/// Loading runs on the blocking pool, bounded by the model load timeout when
/// one is configured. Any failure leaves the startup in `Failed` and is
/// returned to the caller.
pub async fn initialize(config: &ClassifierConfig) -> Result<ServiceState> {
    initialize_with(config, Analyzer::from_config).await
}

async fn initialize_with<F>(config: &ClassifierConfig, load: F) -> Result<ServiceState>
where
    F: FnOnce(&ClassifierConfig) -> Result<Analyzer> + Send + 'static,
{
    let mut startup = Startup::new();
    startup.advance(ProviderPhase::Loading);

    let model_id = config.model_id().to_string();
    info!("Loading toxicity classifier '{}' ({} backend)", model_id, config.backend);

    let outcome = load_analyzer(config, load).await;

    match outcome {
        Ok(analyzer) => {
            startup.advance(ProviderPhase::Ready);
            info!("Classifier loaded successfully");
            Ok(ServiceState::ready(analyzer, model_id))
        }
        Err(err) => {
            startup.advance(ProviderPhase::Failed);
            error!("Error loading classifier: {}", err);
            Err(err)
        }
    }
}

async fn load_analyzer<F>(config: &ClassifierConfig, load: F) -> Result<Analyzer>
where
    F: FnOnce(&ClassifierConfig) -> Result<Analyzer> + Send + 'static,
{
    let owned = config.clone();
    let task = tokio::task::spawn_blocking(move || load(&owned));

    let timeout = match config.backend {
        Backend::Model => config.model.load_timeout(),
        Backend::Keyword => None,
    };

    let joined = match timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| Error::Timeout)?,
        None => task.await,
    };

    joined.map_err(|e| Error::internal(format!("classifier loading task failed: {}", e)))?
}

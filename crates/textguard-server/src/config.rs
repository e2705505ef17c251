//! Service configuration

use crate::cli::Cli;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use textguard_classifiers::{ClassifierConfig, ModelConfig};

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Classifier provider settings
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file {}", config_path))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", config_path))?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(backend) = cli.backend {
            config.classifier.backend = backend;
        }

        if let Some(repo) = &cli.model_repo {
            config.classifier.model = rebase_model(&config.classifier.model, ModelConfig::from_hf(repo));
        }

        if let Some(path) = &cli.model_path {
            config.classifier.model = rebase_model(&config.classifier.model, ModelConfig::from_local(path));
        }

        if let Some(host) = &cli.listen {
            config.server.host = host.clone();
        }

        if let Some(port) = cli.port {
            config.server.port = port;
        }

        Ok(config)
    }

    /// Reject configurations the service cannot start with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }
        if self.server.max_body_bytes == 0 {
            bail!("server.max_body_bytes must be greater than 0");
        }
        self.classifier.validate()?;
        Ok(())
    }
}

/// Take the name and source of `source`, keep the remaining settings of `current`
fn rebase_model(current: &ModelConfig, source: ModelConfig) -> ModelConfig {
    ModelConfig {
        name: source.name,
        source: source.source,
        ..current.clone()
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Listen address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Install the Prometheus recorder and serve `/metrics`
    #[serde(default = "default_true")]
    pub metrics: bool,
}

impl ServerSettings {
    /// Socket address to bind
    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            metrics: true,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_true() -> bool {
    true
}

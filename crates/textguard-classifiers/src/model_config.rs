//! Model configuration structures

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default model served by the model backend
pub const DEFAULT_MODEL: &str = "unitary/toxic-bert";

/// Raw label the model path treats as the positive (toxic) class by default
pub const DEFAULT_POSITIVE_LABEL: &str = "LABEL_1";

/// Configuration for the model-backed classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier reported by the service
    #[serde(default = "default_name")]
    pub name: String,

    /// Where to load the model from
    #[serde(default)]
    pub source: ModelSource,

    /// Inference device: `cpu`, `cuda` or `metal`/`mps`
    #[serde(default = "default_device")]
    pub device: String,

    /// Maximum sequence length in tokens; longer inputs are truncated
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Raw labels that map to `toxic`; every other label maps to `safe`
    #[serde(default = "default_positive_labels")]
    pub positive_labels: Vec<String>,

    /// Upper bound on model loading; unbounded when absent
    #[serde(default)]
    pub load_timeout_secs: Option<u64>,
}

impl ModelConfig {
    /// Create a configuration for a HuggingFace Hub repository
    pub fn from_hf(repo: impl Into<String>) -> Self {
        let repo = repo.into();
        Self {
            name: repo.clone(),
            source: ModelSource::HuggingFace {
                repo,
                revision: default_revision(),
            },
            ..Default::default()
        }
    }

    /// Create a configuration for a local model directory
    pub fn from_local(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            source: ModelSource::Local { path },
            ..Default::default()
        }
    }

    /// Set the inference device
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    /// Set the raw labels mapped to `toxic`
    pub fn with_positive_labels<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.positive_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Model loading bound, if configured
    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            source: ModelSource::default(),
            device: default_device(),
            max_length: default_max_length(),
            positive_labels: default_positive_labels(),
            load_timeout_secs: None,
        }
    }
}

/// Model source configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModelSource {
    /// Load from a local directory holding `config.json`, weights and tokenizer
    Local { path: PathBuf },

    /// Download from HuggingFace Hub
    HuggingFace {
        repo: String,
        #[serde(default = "default_revision")]
        revision: String,
    },
}

impl Default for ModelSource {
    fn default() -> Self {
        Self::HuggingFace {
            repo: DEFAULT_MODEL.to_string(),
            revision: default_revision(),
        }
    }
}

fn default_name() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_revision() -> String {
    "main".to_string()
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_max_length() -> usize {
    512
}

fn default_positive_labels() -> Vec<String> {
    vec![DEFAULT_POSITIVE_LABEL.to_string()]
}

//! Classifier backend configuration

use crate::keyword::{DEFAULT_KEYWORDS, DEFAULT_THRESHOLD, DEFAULT_WEIGHT, KEYWORD_MODEL_ID};
use crate::model_config::ModelConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use textguard_core::{Error, Result};

/// Which provider serves analysis requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Pretrained sequence-classification model
    #[default]
    Model,
    /// Keyword-counting fallback scorer
    Keyword,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "model" => Ok(Self::Model),
            "keyword" | "fallback" => Ok(Self::Keyword),
            other => Err(format!(
                "unknown backend '{}', expected 'model' or 'keyword'",
                other
            )),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => f.write_str("model"),
            Self::Keyword => f.write_str("keyword"),
        }
    }
}

/// Keyword fallback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// Keywords counted (case-insensitive substring match)
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Score added per distinct matched keyword
    #[serde(default = "default_weight")]
    pub weight: f32,

    /// Scores strictly above this are toxic
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            weight: default_weight(),
            threshold: default_threshold(),
        }
    }
}

/// Configuration for the classifier provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Active backend
    #[serde(default)]
    pub backend: Backend,

    /// Model backend settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Keyword backend settings
    #[serde(default)]
    pub keyword: KeywordConfig,
}

impl ClassifierConfig {
    /// Configuration selecting the keyword backend with default settings
    pub fn keyword() -> Self {
        Self {
            backend: Backend::Keyword,
            ..Default::default()
        }
    }

    /// Model identifier the active backend reports
    pub fn model_id(&self) -> &str {
        match self.backend {
            Backend::Model => &self.model.name,
            Backend::Keyword => KEYWORD_MODEL_ID,
        }
    }

    /// Check the settings of the active backend
    pub fn validate(&self) -> Result<()> {
        match self.backend {
            Backend::Model => {
                if self.model.max_length == 0 {
                    return Err(Error::config("model.max_length must be greater than 0"));
                }
                if self.model.positive_labels.is_empty() {
                    return Err(Error::config("model.positive_labels must not be empty"));
                }
                if !cfg!(feature = "ml-models") {
                    return Err(Error::config(
                        "model backend requires the 'ml-models' feature",
                    ));
                }
            }
            Backend::Keyword => {
                if self.keyword.keywords.iter().all(|k| k.trim().is_empty()) {
                    return Err(Error::config("keyword.keywords must not be empty"));
                }
                if self.keyword.weight.is_nan() || self.keyword.weight <= 0.0 {
                    return Err(Error::config("keyword.weight must be greater than 0"));
                }
                if !(0.0..=1.0).contains(&self.keyword.threshold) {
                    return Err(Error::config("keyword.threshold must be within [0, 1]"));
                }
            }
        }
        Ok(())
    }
}

fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

fn default_weight() -> f32 {
    DEFAULT_WEIGHT
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

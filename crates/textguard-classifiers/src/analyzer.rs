//! Analyzer: a classifier plus the mapping of its raw labels onto the
//! public `toxic` / `safe` vocabulary.

use crate::classifier::{ClassificationResult, Classifier};
use crate::config::{Backend, ClassifierConfig};
use crate::keyword::{KeywordClassifier, TOXIC_LABEL};
use textguard_core::{Error, Label, Result, Verdict};

/// Classifier provider with label mapping
pub struct Analyzer {
    classifier: Box<dyn Classifier>,
    positive_labels: Vec<String>,
}

impl Analyzer {
    /// Wrap a classifier; raw labels in `positive_labels` map to `toxic`
    pub fn new<S: Into<String>>(
        classifier: Box<dyn Classifier>,
        positive_labels: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            classifier,
            positive_labels: positive_labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Keyword fallback analyzer with default settings
    pub fn keyword() -> Result<Self> {
        Ok(Self::new(Box::new(KeywordClassifier::new()?), [TOXIC_LABEL]))
    }

    /// Build the provider selected by `config`.
    ///
    /// Blocking: the model backend downloads and loads weights.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        config.validate()?;

        match config.backend {
            Backend::Keyword => {
                tracing::info!(
                    "Using keyword fallback scorer ({} keywords)",
                    config.keyword.keywords.len()
                );
                let classifier = KeywordClassifier::from_config(&config.keyword)?;
                Ok(Self::new(Box::new(classifier), [TOXIC_LABEL]))
            }
            Backend::Model => Self::load_model(config),
        }
    }

    #[cfg(feature = "ml-models")]
    fn load_model(config: &ClassifierConfig) -> Result<Self> {
        tracing::info!("Loading toxicity classifier '{}'", config.model.name);
        let classifier = crate::bert::BertSequenceClassifier::load(&config.model)?;
        Ok(Self::new(
            Box::new(classifier),
            config.model.positive_labels.iter().cloned(),
        ))
    }

    #[cfg(not(feature = "ml-models"))]
    fn load_model(_config: &ClassifierConfig) -> Result<Self> {
        Err(Error::config(
            "model backend requires the 'ml-models' feature",
        ))
    }

    /// Model identifier of the wrapped classifier
    pub fn model_id(&self) -> &str {
        self.classifier.name()
    }

    /// Map a raw result onto the public vocabulary. The score passes through
    /// unmodified.
    pub fn verdict(&self, raw: &ClassificationResult) -> Verdict {
        let label = if self.positive_labels.iter().any(|l| *l == raw.label) {
            Label::Toxic
        } else {
            Label::Safe
        };
        Verdict::new(label, raw.score)
    }

    /// Classify one text
    pub async fn analyze(&self, text: &str) -> Result<Verdict> {
        let raw = self.classifier.classify(text).await?;
        tracing::debug!(
            raw_label = %raw.label,
            score = raw.score,
            latency_us = raw.latency_us,
            all_scores = ?raw.metadata.all_scores,
            "classified"
        );
        Ok(self.verdict(&raw))
    }

    /// Classify a sequence of texts with a single provider call. Results are
    /// in input order; any failure fails the whole batch.
    pub async fn analyze_batch(&self, texts: &[String]) -> Result<Vec<Verdict>> {
        let raw = self.classifier.classify_batch(texts).await?;

        if raw.len() != texts.len() {
            return Err(Error::classifier(format!(
                "Provider returned {} results for {} inputs",
                raw.len(),
                texts.len()
            )));
        }

        Ok(raw.iter().map(|r| self.verdict(r)).collect())
    }
}

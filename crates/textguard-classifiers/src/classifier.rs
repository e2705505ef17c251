//! Classifier trait and common types

use async_trait::async_trait;
use textguard_core::Result;

/// Trait for all classifiers
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the given text
    async fn classify(&self, text: &str) -> Result<ClassificationResult>;

    /// Classify a sequence of texts in one call.
    ///
    /// Results are returned in input order. A failure on any item fails the
    /// whole call; no partial results are produced.
    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<ClassificationResult>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.classify(text).await?);
        }
        Ok(results)
    }

    /// Get the classifier name (model identifier)
    fn name(&self) -> &str;
}

/// Raw result of classification, before mapping onto the public vocabulary
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    /// Raw classification label (e.g. `LABEL_1`)
    pub label: String,

    /// Confidence score (0.0-1.0)
    pub score: f32,

    /// Additional metadata
    pub metadata: ClassificationMetadata,

    /// Latency in microseconds
    pub latency_us: u64,
}

impl ClassificationResult {
    /// Create a new classification result
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
            metadata: ClassificationMetadata::default(),
            latency_us: 0,
        }
    }
}

/// Metadata about classification
#[derive(Debug, Clone, Default)]
pub struct ClassificationMetadata {
    /// Matched spans (for keyword-based classifiers)
    pub spans: Vec<(usize, usize)>,

    /// Model name or version
    pub model: Option<String>,

    /// All class scores (for model-backed classifiers)
    pub all_scores: Option<Vec<(String, f32)>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoLength;

    #[async_trait]
    impl Classifier for EchoLength {
        async fn classify(&self, text: &str) -> Result<ClassificationResult> {
            if text == "boom" {
                return Err(textguard_core::Error::classifier("boom"));
            }
            Ok(ClassificationResult::new(format!("len_{}", text.len()), 0.5))
        }

        fn name(&self) -> &str {
            "echo-length"
        }
    }

    #[tokio::test]
    async fn test_default_batch_preserves_order() {
        let texts = vec!["a".to_string(), "bbb".to_string(), "cc".to_string()];
        let results = EchoLength.classify_batch(&texts).await.unwrap();

        let labels: Vec<_> = results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["len_1", "len_3", "len_2"]);
    }

    #[tokio::test]
    async fn test_default_batch_is_all_or_nothing() {
        let texts = vec!["fine".to_string(), "boom".to_string(), "fine".to_string()];
        assert!(EchoLength.classify_batch(&texts).await.is_err());
    }
}

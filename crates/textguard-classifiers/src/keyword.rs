//! Keyword-counting fallback scorer
//!
//! Stands in for the model when none is available. The score is a fixed
//! weight per distinct keyword found in the text, capped at 1.0, and the
//! text is labelled `toxic` only when the score is strictly above the
//! threshold. Matching is case-insensitive substring containment.

use crate::classifier::{ClassificationMetadata, ClassificationResult, Classifier};
use crate::config::KeywordConfig;
use aho_corasick::AhoCorasick;
use std::time::Instant;
use textguard_core::Result;

/// Identifier reported for the keyword backend
pub const KEYWORD_MODEL_ID: &str = "simple-keyword-analyzer";

/// Keywords scored by default
pub const DEFAULT_KEYWORDS: &[&str] = &["hate", "stupid", "idiot", "terrible", "awful", "bad"];

/// Score added per distinct matched keyword
pub const DEFAULT_WEIGHT: f32 = 0.2;

/// Scores strictly above this are toxic
pub const DEFAULT_THRESHOLD: f32 = 0.3;

/// Raw label emitted for flagged text
pub const TOXIC_LABEL: &str = "toxic";

/// Raw label emitted for unflagged text
pub const SAFE_LABEL: &str = "safe";

/// Deterministic keyword-counting classifier
pub struct KeywordClassifier {
    name: String,
    matcher: AhoCorasick,
    keyword_count: usize,
    weight: f32,
    threshold: f32,
}

impl KeywordClassifier {
    /// Create a classifier with the default keyword list, weight and threshold
    pub fn new() -> Result<Self> {
        Self::with_keywords(DEFAULT_KEYWORDS, DEFAULT_WEIGHT, DEFAULT_THRESHOLD)
    }

    /// Create a classifier from configuration
    pub fn from_config(config: &KeywordConfig) -> Result<Self> {
        Self::with_keywords(&config.keywords, config.weight, config.threshold)
    }

    /// Create a classifier with a custom keyword list
    pub fn with_keywords<S: AsRef<str>>(keywords: &[S], weight: f32, threshold: f32) -> Result<Self> {
        let mut unique: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        unique.sort();
        unique.dedup();

        if unique.is_empty() {
            return Err(textguard_core::Error::config(
                "keyword classifier needs at least one keyword",
            ));
        }

        let matcher = AhoCorasick::builder()
            .build(&unique)
            .map_err(|e| {
                textguard_core::Error::classifier(format!("Failed to build keyword matcher: {}", e))
            })?;

        Ok(Self {
            name: KEYWORD_MODEL_ID.to_string(),
            matcher,
            keyword_count: unique.len(),
            weight,
            threshold,
        })
    }

    /// Heuristic score for `text`: weight × distinct matches, capped at 1.0
    pub fn score(&self, text: &str) -> f32 {
        let (matches, _) = self.scan(text);
        (matches as f32 * self.weight).min(1.0)
    }

    /// Threshold above which text is labelled toxic
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Count distinct keywords present in `text`, plus every match span.
    ///
    /// Matching runs over the Unicode-lowercased text, so spans index into
    /// that form rather than the input.
    fn scan(&self, text: &str) -> (usize, Vec<(usize, usize)>) {
        let lowered = text.to_lowercase();
        let mut seen = vec![false; self.keyword_count];
        let mut spans = Vec::new();

        for m in self.matcher.find_overlapping_iter(&lowered) {
            seen[m.pattern().as_usize()] = true;
            spans.push((m.start(), m.end()));
        }

        (seen.into_iter().filter(|hit| *hit).count(), spans)
    }
}

#[async_trait::async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let start = Instant::now();

        let (matches, spans) = self.scan(text);
        let score = (matches as f32 * self.weight).min(1.0);
        let label = if score > self.threshold {
            TOXIC_LABEL
        } else {
            SAFE_LABEL
        };

        Ok(ClassificationResult {
            label: label.to_string(),
            score,
            metadata: ClassificationMetadata {
                spans,
                model: Some(self.name.clone()),
                ..Default::default()
            },
            latency_us: start.elapsed().as_micros() as u64,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

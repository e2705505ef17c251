//! TextGuard Classifiers
//!
//! Providers that label text as toxic or safe.
//!
//! Two backends are available:
//! - Model: a BERT-family sequence classifier run with Candle (feature
//!   `ml-models`, enabled by default)
//! - Keyword: a deterministic keyword-counting fallback scorer
//!
//! [`Analyzer`] wraps either backend and maps raw provider labels onto the
//! public [`Label`](textguard_core::Label) vocabulary.

pub mod analyzer;
#[cfg(feature = "ml-models")]
pub mod bert;
pub mod classifier;
pub mod config;
pub mod keyword;
pub mod model_config;

pub use analyzer::Analyzer;
#[cfg(feature = "ml-models")]
pub use bert::BertSequenceClassifier;
pub use classifier::{ClassificationMetadata, ClassificationResult, Classifier};
pub use config::{Backend, ClassifierConfig, KeywordConfig};
pub use keyword::{KeywordClassifier, KEYWORD_MODEL_ID};
pub use model_config::{ModelConfig, ModelSource};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::analyzer::Analyzer;
    pub use crate::classifier::{ClassificationResult, Classifier};
    pub use crate::config::{Backend, ClassifierConfig};
    pub use crate::keyword::KeywordClassifier;
}

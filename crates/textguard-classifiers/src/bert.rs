//! BERT sequence classification with Candle
//!
//! Loads a BERT-family checkpoint (backbone, optional pooler, linear
//! classification head) from a local directory or the HuggingFace Hub and
//! runs padded batch inference on tokio's blocking pool. Each result carries
//! the raw top-1 label (`id2label` from `config.json`, else `LABEL_{i}`) and
//! its probability, matching what a text-classification pipeline reports.

use crate::classifier::{ClassificationMetadata, ClassificationResult, Classifier};
use crate::model_config::{ModelConfig, ModelSource};
use async_trait::async_trait;
use candle_core::{DType, Device, IndexOp, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use textguard_core::{Error, Result};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

const SAFETENSORS_WEIGHTS: &str = "model.safetensors";
const PYTORCH_WEIGHTS: &str = "pytorch_model.bin";

/// Classification-head settings read from the checkpoint's `config.json`
#[derive(Debug, Default, Deserialize)]
struct HeadConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,

    #[serde(default)]
    num_labels: Option<usize>,

    #[serde(default)]
    problem_type: Option<String>,
}

impl HeadConfig {
    fn labels(&self) -> Vec<String> {
        let num_labels = if self.id2label.is_empty() {
            self.num_labels.unwrap_or(2)
        } else {
            self.id2label.len()
        };

        (0..num_labels)
            .map(|idx| {
                self.id2label
                    .get(&idx.to_string())
                    .cloned()
                    .unwrap_or_else(|| format!("LABEL_{}", idx))
            })
            .collect()
    }

    fn is_multi_label(&self) -> bool {
        self.problem_type.as_deref() == Some("multi_label_classification")
    }
}

/// BERT-family sequence classifier
pub struct BertSequenceClassifier {
    inner: Arc<BertInner>,
}

struct BertInner {
    name: String,
    tokenizer: Tokenizer,
    model: BertModel,
    pooler: Option<Linear>,
    classifier: Linear,
    device: Device,
    labels: Vec<String>,
    multi_label: bool,
}

impl BertSequenceClassifier {
    /// Resolve, download if needed, and load the configured checkpoint.
    ///
    /// Blocking: performs network and filesystem I/O.
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let model_dir = resolve_model_dir(&config.source)?;
        let device = get_device(&config.device)?;

        let config_path = model_dir.join("config.json");
        let bert_config: BertConfig = parse_json_config(&config_path)?;
        let head: HeadConfig = parse_json_config(&config_path)?;

        let tokenizer = load_tokenizer(&model_dir, config.max_length)?;
        let vb = load_var_builder(&model_dir, &device)?;

        let (model, prefix) = load_bert_backbone(&vb, &bert_config, &["bert", ""])?;
        let pooler = load_pooler(&vb, prefix, bert_config.hidden_size);
        let labels = head.labels();
        let classifier = load_classification_head(&vb, bert_config.hidden_size, labels.len())?;

        tracing::info!(
            "Loaded BERT classifier '{}' with {} labels: {:?}",
            config.name,
            labels.len(),
            labels
        );

        Ok(Self {
            inner: Arc::new(BertInner {
                name: config.name.clone(),
                tokenizer,
                model,
                pooler,
                classifier,
                device,
                labels,
                multi_label: head.is_multi_label(),
            }),
        })
    }

    /// Raw labels the classification head can emit, in index order
    pub fn labels(&self) -> &[String] {
        &self.inner.labels
    }
}

impl BertInner {
    fn infer(&self, texts: &[String]) -> Result<Vec<ClassificationResult>> {
        let start = Instant::now();

        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| Error::classifier(format!("Tokenization failed: {}", e)))?;

        let batch = encodings.len();
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);

        let mut ids = Vec::with_capacity(batch * seq_len);
        let mut type_ids = Vec::with_capacity(batch * seq_len);
        let mut mask = Vec::with_capacity(batch * seq_len);
        for encoding in &encodings {
            if encoding.get_ids().len() != seq_len {
                return Err(Error::classifier("Tokenizer produced ragged batch"));
            }
            ids.extend_from_slice(encoding.get_ids());
            type_ids.extend_from_slice(encoding.get_type_ids());
            mask.extend_from_slice(encoding.get_attention_mask());
        }

        let shape = (batch, seq_len);
        let input_ids = Tensor::from_vec(ids, shape, &self.device)
            .map_err(candle_err("Failed to create input tensor"))?;
        let token_type_ids = Tensor::from_vec(type_ids, shape, &self.device)
            .map_err(candle_err("Failed to create token type tensor"))?;
        let attention_mask = Tensor::from_vec(mask, shape, &self.device)
            .map_err(candle_err("Failed to create attention mask"))?;

        let hidden_states = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(candle_err("Model forward pass failed"))?;

        let cls_embedding = hidden_states
            .i((.., 0))
            .map_err(candle_err("Failed to get CLS token"))?;

        let pooled = match &self.pooler {
            Some(pooler) => pooler
                .forward(&cls_embedding)
                .and_then(|t| t.tanh())
                .map_err(candle_err("Pooler failed"))?,
            None => cls_embedding,
        };

        let logits = self
            .classifier
            .forward(&pooled)
            .map_err(candle_err("Classification head failed"))?;

        let probs = match self.multi_label {
            true => candle_nn::ops::sigmoid(&logits),
            false => candle_nn::ops::softmax(&logits, D::Minus1),
        };
        let probs = probs.map_err(candle_err("Failed to normalize logits"))?;

        let rows: Vec<Vec<f32>> = probs
            .to_vec2()
            .map_err(candle_err("Failed to convert to vec"))?;

        let latency_us = start.elapsed().as_micros() as u64;
        Ok(rows
            .into_iter()
            .map(|row| self.build_result(row, latency_us))
            .collect())
    }

    fn build_result(&self, probs: Vec<f32>, latency_us: u64) -> ClassificationResult {
        let (max_idx, max_prob) = probs
            .iter()
            .copied()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((0, 0.0));

        let label = self
            .labels
            .get(max_idx)
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{}", max_idx));

        let all_scores = self
            .labels
            .iter()
            .zip(probs.iter().copied())
            .map(|(label, prob)| (label.clone(), prob))
            .collect();

        ClassificationResult {
            label,
            score: max_prob,
            metadata: ClassificationMetadata {
                model: Some(self.name.clone()),
                all_scores: Some(all_scores),
                ..Default::default()
            },
            latency_us,
        }
    }
}

#[async_trait]
impl Classifier for BertSequenceClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let mut results = self.classify_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| Error::classifier("Model returned no result"))
    }

    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<ClassificationResult>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let inner = Arc::clone(&self.inner);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || inner.infer(&texts))
            .await
            .map_err(|e| Error::internal(format!("Inference task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        &self.inner.name
    }
}

fn candle_err(context: &'static str) -> impl FnOnce(candle_core::Error) -> Error {
    move |e| Error::classifier(format!("{}: {}", context, e))
}

fn resolve_model_dir(source: &ModelSource) -> Result<PathBuf> {
    match source {
        ModelSource::Local { path } => {
            if !path.is_dir() {
                return Err(Error::classifier(format!(
                    "Model directory does not exist: {}",
                    path.display()
                )));
            }
            Ok(path.clone())
        }
        ModelSource::HuggingFace { repo, revision } => download_from_huggingface(repo, revision),
    }
}

fn download_from_huggingface(repo: &str, revision: &str) -> Result<PathBuf> {
    tracing::info!("Downloading model from HuggingFace: {} @ {}", repo, revision);

    let api = hf_hub::api::sync::Api::new().map_err(|e| {
        Error::classifier(format!("Failed to initialize HuggingFace API: {}", e))
    })?;

    let repo_obj = api.repo(hf_hub::Repo::with_revision(
        repo.to_string(),
        hf_hub::RepoType::Model,
        revision.to_string(),
    ));

    let config_path = repo_obj
        .get("config.json")
        .map_err(|e| Error::classifier(format!("Failed to download config.json: {}", e)))?;

    let found_weights = [SAFETENSORS_WEIGHTS, PYTORCH_WEIGHTS].iter().any(|file| {
        match repo_obj.get(file) {
            Ok(_) => {
                tracing::debug!("Found weight file: {}", file);
                true
            }
            Err(_) => false,
        }
    });
    if !found_weights {
        return Err(Error::classifier(format!(
            "No model weights found (tried {}, {})",
            SAFETENSORS_WEIGHTS, PYTORCH_WEIGHTS
        )));
    }

    let found_tokenizer = ["tokenizer.json", "vocab.txt"]
        .iter()
        .any(|file| repo_obj.get(file).is_ok());
    if !found_tokenizer {
        return Err(Error::classifier(
            "No tokenizer found (tried tokenizer.json, vocab.txt)",
        ));
    }

    let model_dir = config_path
        .parent()
        .ok_or_else(|| Error::classifier("Invalid cache path"))?;

    tracing::info!("Model available at: {}", model_dir.display());
    Ok(model_dir.to_path_buf())
}

fn get_device(device: &str) -> Result<Device> {
    match device.to_lowercase().as_str() {
        "cpu" => Ok(Device::Cpu),
        "cuda" | "cuda:0" => Device::new_cuda(0)
            .map_err(|e| Error::classifier(format!("Failed to initialize CUDA: {}", e))),
        "mps" | "metal" => Device::new_metal(0)
            .map_err(|e| Error::classifier(format!("Failed to initialize Metal: {}", e))),
        other => Err(Error::config(format!("Unknown device '{}'", other))),
    }
}

fn parse_json_config<T: DeserializeOwned>(config_path: &Path) -> Result<T> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        Error::classifier(format!(
            "Failed to read config {}: {}",
            config_path.display(),
            e
        ))
    })?;

    serde_json::from_str(&config_str).map_err(|e| {
        Error::classifier(format!(
            "Failed to parse config {}: {}",
            config_path.display(),
            e
        ))
    })
}

fn load_var_builder(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join(SAFETENSORS_WEIGHTS);
    if safetensors.exists() {
        // SAFETY: the mmaped file belongs to the model cache and is not
        // modified while the process runs.
        return unsafe {
            VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)
        }
        .map_err(candle_err("Failed to load SafeTensors weights"));
    }

    let pytorch = model_dir.join(PYTORCH_WEIGHTS);
    if pytorch.exists() {
        return VarBuilder::from_pth(&pytorch, DType::F32, device)
            .map_err(candle_err("Failed to load PyTorch weights"));
    }

    Err(Error::classifier(format!(
        "No model weights in {} (tried {}, {})",
        model_dir.display(),
        SAFETENSORS_WEIGHTS,
        PYTORCH_WEIGHTS
    )))
}

fn load_bert_backbone(
    vb: &VarBuilder,
    config: &BertConfig,
    prefixes: &[&'static str],
) -> Result<(BertModel, &'static str)> {
    let mut errors = Vec::new();

    for prefix in prefixes {
        let vb_prefix = if prefix.is_empty() {
            vb.clone()
        } else {
            vb.pp(*prefix)
        };

        match BertModel::load(vb_prefix, config) {
            Ok(model) => {
                tracing::info!("Loaded BERT backbone from '{}'", display_prefix(prefix));
                return Ok((model, *prefix));
            }
            Err(e) => errors.push(format!("{}: {}", display_prefix(prefix), e)),
        }
    }

    Err(Error::classifier(format!(
        "Failed to load BERT backbone with tried prefixes [{}]",
        errors.join(" | ")
    )))
}

fn load_pooler(vb: &VarBuilder, prefix: &str, hidden_size: usize) -> Option<Linear> {
    let vb_prefix = if prefix.is_empty() {
        vb.clone()
    } else {
        vb.pp(prefix)
    };

    match candle_nn::linear(hidden_size, hidden_size, vb_prefix.pp("pooler").pp("dense")) {
        Ok(pooler) => Some(pooler),
        Err(e) => {
            tracing::warn!("No pooler weights found, classifying raw CLS embedding: {}", e);
            None
        }
    }
}

fn load_classification_head(vb: &VarBuilder, hidden_size: usize, num_labels: usize) -> Result<Linear> {
    candle_nn::linear(hidden_size, num_labels, vb.pp("classifier")).map_err(|e| {
        Error::classifier(format!(
            "Failed to load classification head (hidden_size={}, num_labels={}): {}",
            hidden_size, num_labels, e
        ))
    })
}

fn display_prefix(prefix: &str) -> &str {
    if prefix.is_empty() {
        "<root>"
    } else {
        prefix
    }
}

fn load_tokenizer(model_dir: &Path, max_length: usize) -> Result<Tokenizer> {
    let mut tokenizer = read_tokenizer(model_dir)?;

    let pad_token = "[PAD]".to_string();
    let pad_id = tokenizer.token_to_id(&pad_token).unwrap_or(0);
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        pad_id,
        pad_token,
        ..Default::default()
    }));
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| Error::classifier(format!("Failed to configure truncation: {}", e)))?;

    Ok(tokenizer)
}

fn read_tokenizer(model_dir: &Path) -> Result<Tokenizer> {
    let tokenizer_json_path = model_dir.join("tokenizer.json");
    if tokenizer_json_path.exists() {
        tracing::debug!("Loading tokenizer from tokenizer.json");
        return Tokenizer::from_file(&tokenizer_json_path)
            .map_err(|e| Error::classifier(format!("Failed to load tokenizer.json: {}", e)));
    }

    let vocab_path = model_dir.join("vocab.txt");
    if vocab_path.exists() {
        tracing::debug!("Building tokenizer from vocab.txt");

        use tokenizers::models::wordpiece::WordPiece;
        use tokenizers::normalizers::BertNormalizer;
        use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
        use tokenizers::processors::bert::BertProcessing;

        let wordpiece = WordPiece::from_file(vocab_path.to_string_lossy().as_ref())
            .unk_token("[UNK]".to_string())
            .build()
            .map_err(|e| Error::classifier(format!("Failed to build WordPiece model: {}", e)))?;

        let mut tokenizer = Tokenizer::new(wordpiece);
        tokenizer.with_normalizer(Some(BertNormalizer::default()));
        tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));

        let sep = ("[SEP]".to_string(), 102);
        let cls = ("[CLS]".to_string(), 101);
        tokenizer.with_post_processor(Some(BertProcessing::new(sep, cls)));

        return Ok(tokenizer);
    }

    Err(Error::classifier(format!(
        "No tokenizer found in {} (tried tokenizer.json, vocab.txt)",
        model_dir.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_default_to_pipeline_names() {
        let head = HeadConfig::default();
        assert_eq!(head.labels(), vec!["LABEL_0", "LABEL_1"]);
        assert!(!head.is_multi_label());
    }

    #[test]
    fn test_labels_from_id2label() {
        let head: HeadConfig = serde_json::from_str(
            r#"{
                "id2label": {"1": "toxic", "0": "non-toxic"},
                "problem_type": "single_label_classification"
            }"#,
        )
        .unwrap();
        assert_eq!(head.labels(), vec!["non-toxic", "toxic"]);
        assert!(!head.is_multi_label());
    }

    #[test]
    fn test_labels_fill_gaps_in_id2label() {
        let head: HeadConfig = serde_json::from_str(
            r#"{"id2label": {"0": "toxic", "2": "obscene", "3": "insult"}}"#,
        )
        .unwrap();
        // three entries, so indices 0..3; index 1 is missing from the map
        assert_eq!(head.labels(), vec!["toxic", "LABEL_1", "obscene"]);
    }

    #[test]
    fn test_multi_label_problem_type() {
        let head: HeadConfig =
            serde_json::from_str(r#"{"problem_type": "multi_label_classification"}"#).unwrap();
        assert!(head.is_multi_label());
    }

    #[test]
    fn test_get_device() {
        assert!(matches!(get_device("cpu"), Ok(Device::Cpu)));
        assert!(matches!(get_device("CPU"), Ok(Device::Cpu)));
        assert!(matches!(get_device("tpu"), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_local_model_fails() {
        let config = ModelConfig::from_local("/nonexistent/textguard/model");
        match BertSequenceClassifier::load(&config) {
            Err(Error::Classifier(msg)) => assert!(msg.contains("does not exist")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("load should fail for a missing directory"),
        }
    }
}

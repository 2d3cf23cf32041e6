//! Sentence embedding using Candle and BGE-small-en-v1.5
//!
//! Loads the BAAI/bge-small-en-v1.5 model from the HuggingFace cache
//! (downloading ~130MB on first use) and produces 384-dimensional,
//! L2-normalized CLS embeddings. Watchlist entries and transaction cells
//! are symmetric inputs, so no query instruction prefix is applied.

use anyhow::Context;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::embedder::{Embedder, EmbeddingError};

/// Model repository on HuggingFace Hub
pub const MODEL_REPO: &str = "BAAI/bge-small-en-v1.5";

/// Embedding dimension of BGE-small
pub const EMBEDDING_DIM: usize = 384;

/// BERT-family sentence embedder
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_name: String,
}

impl BertEmbedder {
    /// Load the default BGE-small model
    pub fn new() -> Result<Self, EmbeddingError> {
        Self::with_model(MODEL_REPO)
    }

    /// Load a specific BERT-architecture model from the hub
    pub fn with_model(model_name: &str) -> Result<Self, EmbeddingError> {
        Self::load(model_name).map_err(|e| EmbeddingError::ModelLoad(format!("{e:#}")))
    }

    fn load(model_name: &str) -> anyhow::Result<Self> {
        info!("Loading embedding model: {}", model_name);

        let device = Device::Cpu;

        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::new(model_name.to_string(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .context("Failed to download config.json")?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .context("Failed to download tokenizer.json")?;
        let weights_path = repo
            .get("model.safetensors")
            .context("Failed to download model.safetensors")?;

        let config: Config = serde_json_config(&config_path)?;
        debug!("Model config: hidden_size={}", config.hidden_size);

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)
                .context("Failed to load model weights")?
        };
        let model = BertModel::load(vb, &config).context("Failed to build BERT model")?;

        info!("Embedding model loaded: {}", model_name);

        Ok(Self {
            model,
            tokenizer,
            device,
            model_name: model_name.to_string(),
        })
    }

    fn forward_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = Vec::with_capacity(texts.len() * max_len);
        let mut attention_mask = Vec::with_capacity(texts.len() * max_len);
        let mut token_type_ids = Vec::with_capacity(texts.len() * max_len);

        for encoding in &encodings {
            let pad = max_len - encoding.get_ids().len();
            input_ids.extend(encoding.get_ids().iter().copied().chain(std::iter::repeat(0).take(pad)));
            attention_mask.extend(
                encoding
                    .get_attention_mask()
                    .iter()
                    .copied()
                    .chain(std::iter::repeat(0).take(pad)),
            );
            token_type_ids.extend(
                encoding
                    .get_type_ids()
                    .iter()
                    .copied()
                    .chain(std::iter::repeat(0).take(pad)),
            );
        }

        let shape = (texts.len(), max_len);
        let input_ids = Tensor::from_vec(input_ids, shape, &self.device)?.to_dtype(DType::U32)?;
        let attention_mask = Tensor::from_vec(attention_mask, shape, &self.device)?;
        let token_type_ids =
            Tensor::from_vec(token_type_ids, shape, &self.device)?.to_dtype(DType::U32)?;

        let output = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // CLS pooling: [:, 0, :]
        let cls = output.narrow(1, 0, 1)?.squeeze(1)?;
        let norm = cls.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f64::MAX)?;
        let normalized = cls.broadcast_div(&norm)?;

        Ok(normalized.to_vec2::<f32>()?)
    }
}

fn serde_json_config(path: &std::path::Path) -> anyhow::Result<Config> {
    let raw = std::fs::read_to_string(path).context("Failed to read config.json")?;
    Ok(serde_json::from_str(&raw).context("Failed to parse config.json")?)
}

impl Embedder for BertEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Ok(vec![0.0; EMBEDDING_DIM]);
        }
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| EmbeddingError::Inference("empty model output".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.forward_batch(texts)
            .map_err(|e| EmbeddingError::Inference(format!("{e:#}")))
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

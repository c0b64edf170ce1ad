// Local sentence embeddings via candle
use anyhow::{Context, Result};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::Embedder;
use crate::errors::RagError;

/// Korean sentence-transformer the index is built with by default
pub const DEFAULT_MODEL_ID: &str = "jhgan/ko-sroberta-multitask";

/// Longest token sequence fed to the encoder
const MAX_SEQUENCE_LENGTH: usize = 512;

/// Embedding engine running a BERT-family encoder on the CPU
pub struct EmbeddingEngine {
    model: Arc<BertModel>,
    tokenizer: Arc<Tokenizer>,
    device: Device,
    dimension: usize,
    model_id: String,
}

impl EmbeddingEngine {
    /// Load a model from the HuggingFace Hub (downloads on first use)
    pub fn new(model_id: &str) -> Result<Self> {
        let device = Device::Cpu;

        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo.get("config.json")
            .context("Failed to download model config")?;
        let tokenizer_path = repo.get("tokenizer.json")
            .context("Failed to download tokenizer")?;

        let config_contents = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;
        let mut config: Config = serde_json::from_str(&config_contents)
            .context("Failed to parse model config")?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        let mut tensors: HashMap<String, Tensor> = match repo.get("model.safetensors") {
            Ok(weights_path) => candle_core::safetensors::load(weights_path, &device)
                .context("Failed to load model weights")?,
            Err(_) => {
                let weights_path: PathBuf = repo.get("pytorch_model.bin")
                    .context("Failed to download model weights")?;
                candle_core::pickle::read_all(weights_path)
                    .context("Failed to load model weights")?
                    .into_iter()
                    .collect()
            }
        };

        let offset = position_offset(config.model_type.as_deref(), config.pad_token_id);
        if offset > 0 {
            shift_positions(&mut tensors, offset)?;
            config.max_position_embeddings -= offset;
            debug!(offset, "dropped leading position embeddings");
        }

        let vb = VarBuilder::from_tensors(tensors, DType::F32, &device);
        let model = BertModel::load(vb, &config)
            .context("Failed to create encoder model")?;

        info!(model = model_id, dimension = config.hidden_size, "embedding model loaded");

        Ok(Self {
            model: Arc::new(model),
            tokenizer: Arc::new(tokenizer),
            device,
            dimension: config.hidden_size,
            model_id: model_id.to_string(),
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Encode a batch with mean pooling over the attention mask
    pub fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self.tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let token_ids_vec: Vec<Vec<u32>> = encodings
            .iter()
            .map(|e| e.get_ids().iter().take(MAX_SEQUENCE_LENGTH).copied().collect())
            .collect();
        let attention_mask_vec: Vec<Vec<u32>> = encodings
            .iter()
            .map(|e| e.get_attention_mask().iter().take(MAX_SEQUENCE_LENGTH).copied().collect())
            .collect();

        let max_len = token_ids_vec.iter().map(|ids| ids.len()).max().unwrap_or(0);
        let batch_size = texts.len();

        let mut padded_ids = vec![vec![0u32; max_len]; batch_size];
        let mut padded_mask = vec![vec![0u32; max_len]; batch_size];

        for (i, (ids, mask)) in token_ids_vec.iter().zip(attention_mask_vec.iter()).enumerate() {
            padded_ids[i][..ids.len()].copy_from_slice(ids);
            padded_mask[i][..mask.len()].copy_from_slice(mask);
        }

        let flat_ids: Vec<u32> = padded_ids.into_iter().flatten().collect();
        let flat_mask: Vec<u32> = padded_mask.into_iter().flatten().collect();

        let token_ids = Tensor::from_vec(flat_ids, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(flat_mask, (batch_size, max_len), &self.device)?;
        let token_type_ids = token_ids.zeros_like()?;

        let hidden = self.model.forward(&token_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = Self::mean_pool(&hidden, &attention_mask)?;

        debug!(batch = batch_size, seq_len = max_len, "encoded batch");

        Ok(pooled.to_vec2::<f32>()?)
    }

    fn mean_pool(embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask_expanded = attention_mask
            .unsqueeze(2)?
            .expand(embeddings.shape())?
            .to_dtype(embeddings.dtype())?;

        let sum_embeddings = (embeddings * &mask_expanded)?.sum(1)?;
        let sum_mask = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;

        Ok(sum_embeddings.broadcast_div(&sum_mask)?)
    }
}

/// Rows to skip at the start of the position table
///
/// RoBERTa checkpoints number positions from `pad_token_id + 1`, the BERT
/// encoder from 0.
fn position_offset(model_type: Option<&str>, pad_token_id: usize) -> usize {
    match model_type {
        Some("roberta" | "xlm-roberta" | "camembert") => pad_token_id + 1,
        _ => 0,
    }
}

/// Drop the first `offset` rows of every position embedding table
fn shift_positions(tensors: &mut HashMap<String, Tensor>, offset: usize) -> Result<()> {
    for (name, tensor) in tensors.iter_mut() {
        if !name.ends_with("embeddings.position_embeddings.weight") {
            continue;
        }
        let (rows, _) = tensor.dims2()?;
        if rows <= offset {
            anyhow::bail!("position table {} has only {} rows", name, rows);
        }
        *tensor = tensor.narrow(0, offset, rows - offset)?;
    }
    Ok(())
}

#[async_trait]
impl Embedder for EmbeddingEngine {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> crate::errors::Result<Vec<Vec<f32>>> {
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        self.encode(&refs)
            .map_err(|e| RagError::RetrievalService(format!("embedding failed: {:#}", e)))
    }
}

//! Local embeddings using Candle (pure Rust)
//!
//! BERT sentence-embedding models downloaded from HuggingFace. No ONNX
//! runtime.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use hf_hub::{api::sync::ApiBuilder, Repo, RepoType};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::EmbeddingProvider;
use crate::config::{DevicePreference, EmbeddingModel};

// BERT models have max 512 position embeddings
const MAX_SEQ_LEN: usize = 512;

struct Encoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

pub struct CandleEmbedder {
    encoder: Arc<Encoder>,
    name: String,
    dimensions: usize,
}

impl CandleEmbedder {
    /// Download (or reuse the cached copy of) `embedding_model` and load it on `device`
    pub fn new_with_model(
        embedding_model: &EmbeddingModel,
        preference: &DevicePreference,
        show_progress: bool,
    ) -> Result<Self> {
        let device = resolve_device(preference)?;
        let model_id = embedding_model.hf_id();
        info!(
            model = embedding_model.name(),
            size_mb = embedding_model.size_mb(),
            preference = preference.name(),
            device = ?device,
            "loading embedding model"
        );

        let api = ApiBuilder::new()
            .with_progress(show_progress)
            .build()
            .context("Failed to create HuggingFace API")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo.get("config.json").context("Failed to get config.json")?;
        let tokenizer_path = repo.get("tokenizer.json").context("Failed to get tokenizer.json")?;
        let weights_path = repo.get("model.safetensors").context("Failed to get model.safetensors")?;

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let bert_config: BertConfig = serde_json::from_str(&config_str)
            .context("Failed to parse model config.json")?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        // SAFETY: the safetensors file is owned by the hf-hub cache and not modified while mapped
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)?
        };
        let model = BertModel::load(vb, &bert_config).context("Failed to load BERT weights")?;

        Ok(Self {
            encoder: Arc::new(Encoder {
                model,
                tokenizer,
                device,
            }),
            name: embedding_model.name().to_string(),
            dimensions: embedding_model.dimensions(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for CandleEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimensions)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let encoder = Arc::clone(&self.encoder);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || encoder.encode(&texts))
            .await
            .context("Embedding task panicked")?
    }
}

impl Encoder {
    /// Mean-pooled, L2-normalized sentence embeddings
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let tokens = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let max_len = tokens
            .iter()
            .map(|t| t.get_ids().len().min(MAX_SEQ_LEN))
            .max()
            .unwrap_or(0);

        let mut input_ids_vec = Vec::with_capacity(texts.len() * max_len);
        let mut attention_mask_vec = Vec::with_capacity(texts.len() * max_len);

        for encoding in &tokens {
            let mut ids: Vec<u32> = encoding.get_ids().iter().take(MAX_SEQ_LEN).copied().collect();
            let mut mask: Vec<u32> = encoding
                .get_attention_mask()
                .iter()
                .take(MAX_SEQ_LEN)
                .copied()
                .collect();

            ids.resize(max_len, 0);
            mask.resize(max_len, 0);

            input_ids_vec.extend(ids);
            attention_mask_vec.extend(mask);
        }

        let batch_size = texts.len();
        let shape = (batch_size, max_len);
        let input_ids = Tensor::from_vec(input_ids_vec, shape, &self.device)?;
        let attention_mask = Tensor::from_vec(attention_mask_vec, shape, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;

        let embeddings = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // Mean pooling over the sequence dimension, padding excluded
        let attention_mask_f = attention_mask.to_dtype(DTYPE)?;
        let mask_expanded = attention_mask_f.unsqueeze(2)?.broadcast_as(embeddings.shape())?;
        let sum_embeddings = (embeddings * mask_expanded)?.sum(1)?;
        let sum_mask = attention_mask_f.sum(1)?.unsqueeze(1)?;
        let mean_embeddings = sum_embeddings.broadcast_div(&sum_mask)?;

        let norms = mean_embeddings.sqr()?.sum(1)?.sqrt()?.unsqueeze(1)?;
        let normalized = mean_embeddings.broadcast_div(&norms)?;

        debug!(batch_size, seq_len = max_len, "encoded batch");
        Ok(normalized.to_vec2()?)
    }
}

fn resolve_device(preference: &DevicePreference) -> Result<Device> {
    let device = match preference {
        DevicePreference::Cpu => Device::Cpu,
        DevicePreference::Cuda => Device::new_cuda(0).context("CUDA device requested but unavailable")?,
        DevicePreference::Metal => Device::new_metal(0).context("Metal device requested but unavailable")?,
        DevicePreference::Auto => {
            if candle_core::utils::cuda_is_available() {
                Device::new_cuda(0)?
            } else if candle_core::utils::metal_is_available() {
                Device::new_metal(0)?
            } else {
                Device::Cpu
            }
        }
    };
    Ok(device)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_device() {
        assert!(matches!(resolve_device(&DevicePreference::Cpu).unwrap(), Device::Cpu));
    }

    #[test]
    fn test_auto_device_resolves() {
        assert!(resolve_device(&DevicePreference::Auto).is_ok());
    }
}

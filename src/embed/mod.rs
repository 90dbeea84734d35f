//! Embedding providers
//!
//! Chunk vectors come from one of two backends behind [`EmbeddingProvider`]:
//! a local Candle BERT model or an OpenAI-compatible HTTP endpoint.

mod candle;
mod openai;

pub use self::candle::CandleEmbedder;
pub use self::openai::OpenAiEmbedder;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::{EmbeddingBackend, EmbeddingConfig};

/// Trait for embedding backends
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Name recorded in chunk metadata
    fn name(&self) -> &str;

    /// Vector size, when known before the first request
    fn dimension(&self) -> Option<usize>;

    /// Embed a batch of texts, one vector per input in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embed `texts` in batches of `batch_size`.
///
/// Fails if the provider returns the wrong number of vectors or vectors of
/// differing size.
pub async fn embed_all(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let batch_size = batch_size.max(1);
    let mut vectors = Vec::with_capacity(texts.len());
    let mut expected_dim = provider.dimension();

    for (batch_index, batch) in texts.chunks(batch_size).enumerate() {
        let embedded = provider
            .embed_batch(batch)
            .await
            .with_context(|| format!("{} failed on batch {}", provider.name(), batch_index))?;

        anyhow::ensure!(
            embedded.len() == batch.len(),
            "{} returned {} embeddings for {} inputs",
            provider.name(),
            embedded.len(),
            batch.len()
        );

        for vector in &embedded {
            let dim = *expected_dim.get_or_insert(vector.len());
            anyhow::ensure!(
                vector.len() == dim,
                "{} returned a {}-dimensional vector, expected {}",
                provider.name(),
                vector.len(),
                dim
            );
        }

        debug!(batch = batch_index, size = batch.len(), "embedded batch");
        vectors.extend(embedded);
    }

    Ok(vectors)
}

/// Build the configured provider. `None` when embeddings are disabled.
pub async fn build_provider(
    config: &EmbeddingConfig,
    show_progress: bool,
) -> Result<Option<Arc<dyn EmbeddingProvider>>> {
    match config.backend {
        EmbeddingBackend::Disabled => {
            info!("embeddings disabled");
            Ok(None)
        }
        EmbeddingBackend::Local => {
            let model = config.model.clone();
            let device = config.device.clone();
            let embedder = tokio::task::spawn_blocking(move || {
                CandleEmbedder::new_with_model(&model, &device, show_progress)
            })
            .await
            .context("Embedding model loader panicked")??;
            let provider: Arc<dyn EmbeddingProvider> = Arc::new(embedder);
            Ok(Some(provider))
        }
        EmbeddingBackend::OpenAi => {
            let embedder = OpenAiEmbedder::from_config(&config.openai)?;
            info!(model = %config.openai.model, endpoint = %embedder.endpoint(), "using remote embeddings");
            let provider: Arc<dyn EmbeddingProvider> = Arc::new(embedder);
            Ok(Some(provider))
        }
    }
}

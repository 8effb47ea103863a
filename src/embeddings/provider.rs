use crate::config::EmbeddingConfig;
use crate::types::{AppError, AppResult, EmbeddingBackend};
use async_trait::async_trait;
use std::sync::Arc;

/// Turns text into dense vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts; the result has one vector per input, in order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AppError::Embedding("Provider returned no vector".to_string()))
    }

    /// Model identifier stored alongside the index
    fn model(&self) -> &str;

    fn name(&self) -> &str;
}

/// Build the embedding provider named in the configuration
pub fn create_embedder(config: &EmbeddingConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingBackend::HuggingFace => Arc::new(crate::embeddings::huggingface::HuggingFaceEmbedder::new(
            &config.api_key,
            &config.model,
            config.base_url.as_deref(),
        )),
        EmbeddingBackend::OpenAI => Arc::new(crate::embeddings::openai::OpenAIEmbedder::new(
            &config.api_key,
            &config.model,
            config.base_url.as_deref(),
        )),
    };
    Ok(embedder)
}

/// Check that a provider answered with one vector per input
pub(crate) fn ensure_batch_len(
    provider: &str,
    expected: usize,
    vectors: &[Vec<f32>],
) -> AppResult<()> {
    if vectors.len() != expected {
        return Err(AppError::Embedding(format!(
            "{} returned {} vectors for {} inputs",
            provider,
            vectors.len(),
            expected
        )));
    }
    Ok(())
}

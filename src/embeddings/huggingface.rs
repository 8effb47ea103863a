// Hugging Face Inference feature-extraction embeddings
// Default model: sentence-transformers/all-MiniLM-L6-v2 (384 dimensions)

use crate::embeddings::provider::{ensure_batch_len, EmbeddingProvider};
use crate::types::AppResult;
use crate::utils::{check_status, with_retry, RetryPolicy};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const HF_INFERENCE_BASE: &str = "https://router.huggingface.co/hf-inference/models";
const PROVIDER: &str = "huggingface";

pub struct HuggingFaceEmbedder {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [String],
    options: InferenceOptions,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

// Sentence-transformer models return one pooled vector per input; plain
// transformer models return one vector per token, which we mean-pool.
#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureExtractionResponse {
    Pooled(Vec<Vec<f32>>),
    TokenLevel(Vec<Vec<Vec<f32>>>),
}

impl HuggingFaceEmbedder {
    pub fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url
                .unwrap_or(HF_INFERENCE_BASE)
                .trim_end_matches('/')
                .to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/{}/pipeline/feature-extraction", self.base_url, self.model)
    }

    async fn request_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut request = self.client.post(self.endpoint()).json(&FeatureExtractionRequest {
            inputs: texts,
            options: InferenceOptions {
                wait_for_model: true,
            },
        });
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = check_status(PROVIDER, request.send().await?).await?;
        let parsed: FeatureExtractionResponse = response.json().await?;

        Ok(match parsed {
            FeatureExtractionResponse::Pooled(vectors) => vectors,
            FeatureExtractionResponse::TokenLevel(inputs) => {
                inputs.iter().map(|tokens| mean_pool(tokens)).collect()
            }
        })
    }
}

fn mean_pool(tokens: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = tokens.first() else {
        return Vec::new();
    };
    let mut pooled = vec![0.0f32; first.len()];
    for token in tokens {
        for (acc, value) in pooled.iter_mut().zip(token) {
            *acc += value;
        }
    }
    let count = tokens.len() as f32;
    pooled.iter_mut().for_each(|v| *v /= count);
    pooled
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(model = %self.model, batch = texts.len(), "Requesting embeddings");
        let vectors = with_retry(self.retry, move || self.request_batch(texts)).await?;
        ensure_batch_len(PROVIDER, texts.len(), &vectors)?;
        Ok(vectors)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

use crate::config::LLMConfig;
use crate::types::{AppError, AppResult, LLMProvider, LLMRequest, LLMResponse};
use async_trait::async_trait;
use tracing::warn;

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Configuration for LLM provider (named to avoid clashing with the LLMProvider enum)
pub struct LLMProviderConfig {
    pub name: String,
    pub api_key: String,
    pub base_url: Option<String>,
}

impl From<&LLMConfig> for LLMProviderConfig {
    fn from(config: &LLMConfig) -> Self {
        Self {
            name: config.provider.to_string(),
            api_key: config.api_key().to_string(),
            base_url: config.base_url.clone(),
        }
    }
}

pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    provider_name: String,
}

impl LLM {
    pub fn new(provider: LLMProviderConfig) -> AppResult<Self> {
        let kind = LLMProvider::from_id(&provider.name)
            .ok_or_else(|| AppError::Config(format!("Unsupported provider: {}", provider.name)))?;

        if provider.api_key.is_empty() && kind != LLMProvider::OpenAICompatible {
            warn!(provider = %kind, "No API key configured, requests will likely be rejected");
        }

        let key = provider.api_key.as_str();
        let base = provider.base_url.as_deref();
        let adapter: Box<dyn LLMAdapter> = match (kind, base) {
            (LLMProvider::HuggingFace, None) => {
                Box::new(crate::llm::huggingface::HuggingFaceAdapter::new(key))
            }
            (LLMProvider::HuggingFace, Some(base)) => Box::new(
                crate::llm::huggingface::HuggingFaceAdapter::new_with_api_base(key, base),
            ),
            (LLMProvider::OpenAI, None) => Box::new(crate::llm::openai::OpenAIAdapter::new(key)),
            (LLMProvider::OpenRouter, None) => {
                Box::new(crate::llm::openrouter::OpenRouterAdapter::new(key))
            }
            (LLMProvider::Groq, None) => Box::new(crate::llm::groq::GroqAdapter::new(key)),
            (LLMProvider::OpenAICompatible, None) => {
                return Err(AppError::Config(
                    "openai-compatible provider needs LLM_BASE_URL".to_string(),
                ))
            }
            // An explicit base URL wins for every OpenAI-style provider.
            (_, Some(base)) => Box::new(crate::llm::openai::OpenAIAdapter::new_with_api_base(key, base)),
        };

        Ok(Self {
            adapter,
            provider_name: kind.to_string(),
        })
    }

    pub fn from_config(config: &LLMConfig) -> AppResult<Self> {
        Self::new(LLMProviderConfig::from(config))
    }

    /// Wrap an existing adapter (custom backends and tests)
    pub fn with_adapter(adapter: Box<dyn LLMAdapter>, provider_name: impl Into<String>) -> Self {
        Self {
            adapter,
            provider_name: provider_name.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str, base_url: Option<&str>) -> LLMProviderConfig {
        LLMProviderConfig {
            name: name.to_string(),
            api_key: "key".to_string(),
            base_url: base_url.map(str::to_string),
        }
    }

    #[test]
    fn test_factory_accepts_known_providers() {
        for name in ["huggingface", "hf", "openai", "openrouter", "groq"] {
            let llm = LLM::new(provider(name, None)).unwrap();
            assert_eq!(llm.provider_name(), LLMProvider::from_id(name).unwrap().to_string());
        }
        let local = LLM::new(provider("local", Some("http://localhost:8000/v1"))).unwrap();
        assert_eq!(local.provider_name(), "openai-compatible");
    }

    #[test]
    fn test_unknown_provider_is_a_config_error() {
        let err = LLM::new(provider("anthropic", None)).err().unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_openai_compatible_requires_base_url() {
        let err = LLM::new(provider("openai-compatible", None)).err().unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }
}

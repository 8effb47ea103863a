// Type definitions shared across the pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LLMProvider {
    HuggingFace,
    OpenAI,
    OpenRouter,
    Groq,
    OpenAICompatible,
}

impl LLMProvider {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "huggingface" | "hf" => Some(LLMProvider::HuggingFace),
            "openai" => Some(LLMProvider::OpenAI),
            "openrouter" => Some(LLMProvider::OpenRouter),
            "groq" => Some(LLMProvider::Groq),
            "openai-compatible" | "local" => Some(LLMProvider::OpenAICompatible),
            _ => None,
        }
    }
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::HuggingFace => write!(f, "huggingface"),
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Groq => write!(f, "groq"),
            LLMProvider::OpenAICompatible => write!(f, "openai-compatible"),
        }
    }
}

/// Hosted service that turns text into vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EmbeddingBackend {
    HuggingFace,
    OpenAI,
}

impl EmbeddingBackend {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "huggingface" | "hf" => Some(EmbeddingBackend::HuggingFace),
            "openai" | "openai-compatible" => Some(EmbeddingBackend::OpenAI),
            _ => None,
        }
    }
}

impl std::fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingBackend::HuggingFace => write!(f, "huggingface"),
            EmbeddingBackend::OpenAI => write!(f, "openai"),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMRequest {
    pub model: String,
    pub messages: Vec<LLMMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system_instruction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LLMMessage {
    pub role: String, // "user", "assistant", "system"
    pub content: String,
}

impl LLMMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMResponse {
    pub content: String,
    pub finish_reason: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API error: {0}")]
    LLMApi(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("{provider} returned {status}: {message}")]
    Upstream {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::LLMApi(_)
            | AppError::Embedding(_)
            | AppError::Http(_)
            | AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_ids_round_trip_through_display() {
        for provider in [
            LLMProvider::HuggingFace,
            LLMProvider::OpenAI,
            LLMProvider::OpenRouter,
            LLMProvider::Groq,
            LLMProvider::OpenAICompatible,
        ] {
            assert_eq!(LLMProvider::from_id(&provider.to_string()), Some(provider));
        }
        assert_eq!(LLMProvider::from_id("HF"), Some(LLMProvider::HuggingFace));
        assert_eq!(LLMProvider::from_id("anthropic"), None);
    }

    #[test]
    fn test_embedding_backend_aliases() {
        assert_eq!(EmbeddingBackend::from_id("hf"), Some(EmbeddingBackend::HuggingFace));
        assert_eq!(EmbeddingBackend::from_id("HuggingFace"), Some(EmbeddingBackend::HuggingFace));
        assert_eq!(
            EmbeddingBackend::from_id("openai-compatible"),
            Some(EmbeddingBackend::OpenAI)
        );
        assert_eq!(EmbeddingBackend::from_id("word2vec"), None);
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::InvalidRequest("empty".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::LLMApi("down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::NotFound("index".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

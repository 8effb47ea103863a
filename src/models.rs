use crate::config::Config;
use crate::rag::RagChain;
use crate::types::AppResult;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::OnceCell;

pub const APP_TITLE: &str = "CrediTrust Consumer Intelligence Bot";
pub const APP_DESCRIPTION: &str = "Analyze thousands of consumer complaints in real-time.";
pub const EXAMPLE_QUESTIONS: [&str; 2] = [
    "What are the top issues with savings accounts?",
    "Tell me about credit card fees.",
];

/// Shared state for the HTTP API. The RAG chain is built on the first
/// question so the server starts without touching the index.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub chain: Arc<OnceCell<Arc<RagChain>>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            chain: Arc::new(OnceCell::new()),
        }
    }

    /// State with an already-built chain (used by tests and the CLI)
    pub fn with_chain(config: Config, chain: Arc<RagChain>) -> Self {
        Self {
            config,
            chain: Arc::new(OnceCell::new_with(Some(chain))),
        }
    }

    /// The RAG chain, loading it on first use. A failed load is retried on the next call.
    pub async fn rag_chain(&self) -> AppResult<Arc<RagChain>> {
        self.chain
            .get_or_try_init(|| async { RagChain::load(&self.config).await.map(Arc::new) })
            .await
            .cloned()
    }

    pub fn chain_loaded(&self) -> bool {
        self.chain.initialized()
    }
}

/// Metadata stored with every indexed chunk
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChunkMetadata {
    pub complaint_id: String,
    pub product: String,
    pub chunk_index: usize,
}

/// A piece of a complaint narrative, the unit that gets embedded and retrieved
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComplaintChunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl ComplaintChunk {
    pub fn new(text: impl Into<String>, metadata: ChunkMetadata) -> Self {
        let text = text.into();
        let mut hasher = Sha256::new();
        hasher.update(metadata.complaint_id.as_bytes());
        hasher.update(metadata.chunk_index.to_le_bytes());
        hasher.update(text.as_bytes());
        let id = hex::encode(&hasher.finalize()[..8]);
        Self { id, text, metadata }
    }
}

/// A retrieved chunk with its cosine similarity to the query
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScoredChunk {
    pub chunk: ComplaintChunk,
    pub score: f32,
}

// API Request/Response types

#[derive(Debug, serde::Deserialize)]
pub struct ChatRequest {
    pub message: ChatInput,
}

/// Chat widgets send either a bare string or a multimodal `{"text": ...}` object.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(untagged)]
pub enum ChatInput {
    Text(String),
    Multimodal {
        #[serde(default)]
        text: String,
    },
}

impl ChatInput {
    pub fn text(&self) -> &str {
        match self {
            ChatInput::Text(text) => text,
            ChatInput::Multimodal { text } => text,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ChatResponse {
    pub message_id: uuid::Uuid,
    /// Answer followed by the evidence block, ready for display
    pub text: String,
    /// Bare model answer
    pub answer: String,
    pub sources: Vec<SourceSnippet>,
    /// Milliseconds spent retrieving and generating
    pub response_time: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SourceSnippet {
    pub rank: usize,
    pub complaint_id: String,
    pub product: String,
    pub snippet: String,
    pub score: f32,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub index_loaded: bool,
    pub llm_provider: String,
    pub llm_model: String,
}

#[derive(Debug, serde::Serialize)]
pub struct ExamplesResponse {
    pub title: &'static str,
    pub description: &'static str,
    pub examples: Vec<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(index: usize) -> ChunkMetadata {
        ChunkMetadata {
            complaint_id: "4521".to_string(),
            product: "Credit card".to_string(),
            chunk_index: index,
        }
    }

    #[test]
    fn test_chunk_ids_are_stable_and_distinct() {
        let a = ComplaintChunk::new("interest rate raised", metadata(0));
        let b = ComplaintChunk::new("interest rate raised", metadata(0));
        let c = ComplaintChunk::new("interest rate raised", metadata(1));

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id.len(), 16);
    }

    #[test]
    fn test_chat_request_accepts_string_or_object() {
        let plain: ChatRequest =
            serde_json::from_str(r#"{"message": "Tell me about credit card fees."}"#).unwrap();
        assert_eq!(plain.message.text(), "Tell me about credit card fees.");

        let object: ChatRequest =
            serde_json::from_str(r#"{"message": {"text": "savings?", "files": []}}"#).unwrap();
        assert_eq!(object.message.text(), "savings?");
    }
}

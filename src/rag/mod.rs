//! Retrieval QA over the complaint index
//!
//! A question is embedded, the nearest complaint chunks are pulled from the
//! vector store, stuffed into the analyst prompt and answered by the chat
//! model. The chain returns the answer together with the chunks it used.

pub mod prompt;

pub use prompt::PromptBuilder;

use crate::config::{Config, LLMConfig};
use crate::embeddings::{create_embedder, Retriever, VectorStore};
use crate::llm::LLM;
use crate::models::{ScoredChunk, SourceSnippet};
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

const SNIPPET_CHARS: usize = 150;
const EVIDENCE_HEADER: &str = "\n\n---\n**🔍 Evidence from CrediTrust Database:**\n";

#[derive(Debug, Clone)]
pub struct RagResponse {
    pub query: String,
    pub result: String,
    pub source_documents: Vec<ScoredChunk>,
}

pub struct RagChain {
    retriever: Retriever,
    llm: LLM,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl RagChain {
    pub fn new(retriever: Retriever, llm: LLM, config: &LLMConfig) -> Self {
        Self {
            retriever,
            llm,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Open the persisted index and connect the embedding and chat providers.
    pub async fn load(config: &Config) -> AppResult<Self> {
        let started = Instant::now();
        let dir = config.data.vector_db_dir.clone();
        let store = tokio::task::spawn_blocking(move || VectorStore::load(&dir))
            .await
            .map_err(|e| AppError::Internal(format!("index loader panicked: {}", e)))??;

        let embedder = create_embedder(&config.embedding)?;
        let retriever = Retriever::new(Arc::new(store), embedder, config.llm.retriever_k)?;
        let llm = LLM::from_config(&config.llm)?;

        info!(
            chunks = retriever.store().len(),
            provider = llm.provider_name(),
            model = %config.llm.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "RAG chain loaded"
        );
        Ok(Self::new(retriever, llm, &config.llm))
    }

    pub fn provider_name(&self) -> &str {
        self.llm.provider_name()
    }

    pub async fn retrieve(&self, query: &str) -> AppResult<Vec<ScoredChunk>> {
        self.retriever.retrieve(query).await
    }

    /// Answer `query` from already retrieved chunks.
    pub async fn generate(&self, query: &str, sources: Vec<ScoredChunk>) -> AppResult<RagResponse> {
        let context = PromptBuilder::build_context(&sources);
        let prompt = PromptBuilder::build_qa_prompt(query, &context);

        let request = LLMRequest {
            model: self.model.clone(),
            messages: vec![LLMMessage::user(prompt)],
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            system_instruction: None,
        };

        let response = self.llm.create_chat_completion(&request).await?;
        debug!(
            finish_reason = %response.finish_reason,
            completion_tokens = response.usage.completion_tokens,
            "Answer generated"
        );

        Ok(RagResponse {
            query: query.to_string(),
            result: response.content.trim().to_string(),
            source_documents: sources,
        })
    }

    /// Retrieve supporting chunks and answer the question.
    pub async fn invoke(&self, query: &str) -> AppResult<RagResponse> {
        let query = validate_query(query)?;
        let sources = self.retrieve(query).await?;
        self.generate(query, sources).await
    }
}

pub fn validate_query(query: &str) -> AppResult<&str> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidRequest("Question must not be empty".to_string()));
    }
    Ok(query)
}

/// First 150 characters of a chunk, trimmed
pub fn snippet(text: &str) -> String {
    let head: String = text.chars().take(SNIPPET_CHARS).collect();
    head.trim().to_string()
}

/// Answer followed by the numbered evidence list shown to the user
pub fn format_chat_reply(response: &RagResponse) -> String {
    let mut reply = response.result.clone();
    reply.push_str(EVIDENCE_HEADER);
    for (i, doc) in response.source_documents.iter().enumerate() {
        reply.push_str(&format!("\n**[{}]** {}...", i + 1, snippet(&doc.chunk.text)));
    }
    reply
}

pub fn source_snippets(response: &RagResponse) -> Vec<SourceSnippet> {
    response
        .source_documents
        .iter()
        .enumerate()
        .map(|(i, doc)| SourceSnippet {
            rank: i + 1,
            complaint_id: doc.chunk.metadata.complaint_id.clone(),
            product: doc.chunk.metadata.product.clone(),
            snippet: snippet(&doc.chunk.text),
            score: doc.score,
        })
        .collect()
}

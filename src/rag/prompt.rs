//! Prompt construction for the complaint QA chain

use crate::models::ScoredChunk;

/// Builds the single-turn prompt sent to the chat model
pub struct PromptBuilder;

impl PromptBuilder {
    /// "Stuff" every retrieved chunk into one context block, separated by a blank line.
    pub fn build_context(results: &[ScoredChunk]) -> String {
        results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn build_qa_prompt(question: &str, context: &str) -> String {
        format!(
            "You are a financial analyst for CrediTrust. Use the context to answer.
    Context: {context}
    Question: {question}
    Answer:"
        )
    }
}

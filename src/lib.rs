// Complaint RAG - retrieval-augmented question answering over CFPB consumer complaints

pub mod cli;
pub mod config;
pub mod embeddings;
pub mod indexing;  // Stratified sampling, chunking and index creation
pub mod llm;
pub mod middleware;
pub mod models;
pub mod preprocess;
pub mod rag;
pub mod routes;
pub mod tui;       // Terminal User Interface
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
// Import specific items from types rather than a glob,
// e.g. use complaint_rag::types::{AppError, AppResult};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}

// Embeddings, text chunking and vector search

pub mod huggingface;
pub mod openai;
pub mod provider;
pub mod text_chunker;
pub mod vector_search;

pub use provider::*;
pub use text_chunker::*;
pub use vector_search::*;

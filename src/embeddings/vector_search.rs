//! Persistent vector store and retriever
//!
//! The store keeps every chunk with its embedding in memory and answers
//! queries with an exhaustive cosine-similarity scan. On disk it is a
//! directory holding `manifest.json` (model, dimensions, counts) and
//! `chunks.json` (chunks with their vectors).

use crate::embeddings::EmbeddingProvider;
use crate::models::{ComplaintChunk, ScoredChunk};
use crate::types::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const MANIFEST_FILE: &str = "manifest.json";
const CHUNKS_FILE: &str = "chunks.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub embedding_model: String,
    pub dimensions: usize,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredChunk {
    chunk: ComplaintChunk,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct VectorStore {
    manifest: IndexManifest,
    entries: Vec<StoredChunk>,
    norms: Vec<f32>,
}

impl VectorStore {
    /// Empty store; `dimensions` of 0 means "take it from the first vector added".
    pub fn new(embedding_model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            manifest: IndexManifest {
                embedding_model: embedding_model.into(),
                dimensions,
                chunk_count: 0,
                created_at: Utc::now(),
            },
            entries: Vec::new(),
            norms: Vec::new(),
        }
    }

    pub fn from_chunks(
        embedding_model: impl Into<String>,
        chunks: Vec<ComplaintChunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> AppResult<Self> {
        let mut store = Self::new(embedding_model, 0);
        store.add(chunks, embeddings)?;
        Ok(store)
    }

    pub fn add(&mut self, chunks: Vec<ComplaintChunk>, embeddings: Vec<Vec<f32>>) -> AppResult<()> {
        if chunks.len() != embeddings.len() {
            return Err(AppError::InvalidRequest(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        if self.manifest.dimensions == 0 {
            if let Some(first) = embeddings.first() {
                self.manifest.dimensions = first.len();
            }
        }
        let dims = self.manifest.dimensions;
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dims) {
            return Err(AppError::InvalidRequest(format!(
                "embedding has {} dimensions, store expects {}",
                bad.len(),
                dims
            )));
        }

        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            self.norms.push(l2_norm(&embedding));
            self.entries.push(StoredChunk { chunk, embedding });
        }
        self.manifest.chunk_count = self.entries.len();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// Top `k` chunks by cosine similarity, best first. Ties keep insertion order.
    pub fn similarity_search(&self, query: &[f32], k: usize) -> AppResult<Vec<ScoredChunk>> {
        if !self.is_empty() && query.len() != self.manifest.dimensions {
            return Err(AppError::InvalidRequest(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.manifest.dimensions
            )));
        }

        let query_norm = l2_norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .zip(&self.norms)
            .enumerate()
            .map(|(i, (entry, norm))| (i, cosine(query, query_norm, &entry.embedding, *norm)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }

    pub fn persist(&self, dir: &Path) -> AppResult<()> {
        std::fs::create_dir_all(dir)?;

        let mut writer = BufWriter::new(File::create(dir.join(CHUNKS_FILE))?);
        serde_json::to_writer(&mut writer, &self.entries)?;
        writer.flush()?;

        // Manifest last: a directory without one is treated as incomplete.
        let mut writer = BufWriter::new(File::create(dir.join(MANIFEST_FILE))?);
        serde_json::to_writer_pretty(&mut writer, &self.manifest)?;
        writer.flush()?;

        info!(
            path = %dir.display(),
            chunks = self.len(),
            dimensions = self.manifest.dimensions,
            "Vector store persisted"
        );
        Ok(())
    }

    pub fn load(dir: &Path) -> AppResult<Self> {
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(AppError::NotFound(format!(
                "No vector store at {}. Run the index command first.",
                dir.display()
            )));
        }

        let manifest: IndexManifest =
            serde_json::from_reader(BufReader::new(File::open(&manifest_path)?))?;
        let entries: Vec<StoredChunk> =
            serde_json::from_reader(BufReader::new(File::open(dir.join(CHUNKS_FILE))?))?;

        if entries.len() != manifest.chunk_count {
            return Err(AppError::Internal(format!(
                "manifest lists {} chunks but {} were found",
                manifest.chunk_count,
                entries.len()
            )));
        }

        let norms = entries.iter().map(|e| l2_norm(&e.embedding)).collect();
        debug!(path = %dir.display(), chunks = entries.len(), "Vector store loaded");

        Ok(Self {
            manifest,
            entries,
            norms,
        })
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let score = dot / (a_norm * b_norm);
    // inf / inf from overflowing norms
    if score.is_nan() {
        0.0
    } else {
        score
    }
}

/// Embeds a question and looks up its nearest chunks
pub struct Retriever {
    store: Arc<VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    k: usize,
}

impl Retriever {
    pub fn new(
        store: Arc<VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        k: usize,
    ) -> AppResult<Self> {
        let indexed_with = &store.manifest().embedding_model;
        if indexed_with != embedder.model() {
            return Err(AppError::Config(format!(
                "index was built with {} but the configured embedding model is {}",
                indexed_with,
                embedder.model()
            )));
        }
        Ok(Self { store, embedder, k })
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    pub async fn retrieve(&self, query: &str) -> AppResult<Vec<ScoredChunk>> {
        let query_vector = self.embedder.embed(query).await?;
        let results = self.store.similarity_search(&query_vector, self.k)?;
        debug!(
            k = self.k,
            hits = results.len(),
            top_score = results.first().map(|r| r.score),
            "Retrieved chunks"
        );
        Ok(results)
    }
}

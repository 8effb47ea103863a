//! Vector index creation
//!
//! Reads the preprocessed complaints, draws a stratified sample per product,
//! splits each narrative into overlapping chunks, embeds them and persists
//! the resulting vector store.

pub mod sampling;

pub use sampling::stratified_sample;

use crate::config::IndexConfig;
use crate::embeddings::{EmbeddingProvider, RecursiveTextSplitter, VectorStore};
use crate::models::{ChunkMetadata, ComplaintChunk};
use crate::preprocess::{column_index, CLEANED_COLUMN, COMPLAINT_ID_COLUMN, PRODUCT_COLUMN};
use crate::types::{AppError, AppResult};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{debug, info, warn};

const MISSING_COMPLAINT_ID: &str = "N/A";

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct IndexReport {
    pub sampled_complaints: usize,
    pub chunks: usize,
    pub dimensions: usize,
}

/// One row of the processed dataset, as much as indexing needs
#[derive(Debug, Clone)]
struct ProcessedComplaint {
    complaint_id: String,
    product: String,
    narrative: String,
}

fn load_processed(path: &Path) -> AppResult<Vec<ProcessedComplaint>> {
    if !path.exists() {
        return Err(AppError::NotFound(format!(
            "Processed data not found at {}. Run the preprocess command first.",
            path.display()
        )));
    }

    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let narrative_idx = column_index(&headers, CLEANED_COLUMN)?;
    let product_idx = column_index(&headers, PRODUCT_COLUMN)?;
    let id_idx = column_index(&headers, COMPLAINT_ID_COLUMN).ok();
    if id_idx.is_none() {
        warn!("No '{}' column, chunks will use {}", COMPLAINT_ID_COLUMN, MISSING_COMPLAINT_ID);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let complaint_id = id_idx
            .and_then(|i| record.get(i))
            .filter(|id| !id.is_empty())
            .unwrap_or(MISSING_COMPLAINT_ID);

        rows.push(ProcessedComplaint {
            complaint_id: complaint_id.to_string(),
            product: record.get(product_idx).unwrap_or_default().to_string(),
            narrative: record.get(narrative_idx).unwrap_or_default().to_string(),
        });
    }
    Ok(rows)
}

fn chunk_complaints(
    complaints: &[ProcessedComplaint],
    splitter: &RecursiveTextSplitter,
) -> Vec<ComplaintChunk> {
    let mut chunks = Vec::new();
    for complaint in complaints {
        for (chunk_index, text) in splitter.split_text(&complaint.narrative).into_iter().enumerate() {
            chunks.push(ComplaintChunk::new(
                text,
                ChunkMetadata {
                    complaint_id: complaint.complaint_id.clone(),
                    product: complaint.product.clone(),
                    chunk_index,
                },
            ));
        }
    }
    chunks
}

/// Build the complaint index from `input_csv` and write it to `db_path`.
pub async fn create_vector_db(
    input_csv: &Path,
    db_path: &Path,
    options: &IndexConfig,
    embedder: &dyn EmbeddingProvider,
    batch_size: usize,
) -> AppResult<IndexReport> {
    info!(path = %input_csv.display(), "Loading processed complaints");
    let complaints = load_processed(input_csv)?;
    let total = complaints.len();

    let sample = stratified_sample(complaints, options.sample_size, options.sample_seed, |c| {
        c.product.as_str()
    });
    info!(total, sampled = sample.len(), "Stratified sample drawn");

    let splitter = RecursiveTextSplitter::new(options.chunk_size, options.chunk_overlap)?;
    let chunks = chunk_complaints(&sample, &splitter);
    info!(chunks = chunks.len(), "Split narratives into chunks");

    if chunks.is_empty() {
        return Err(AppError::InvalidRequest(
            "No text to index: the processed dataset produced no chunks".to_string(),
        ));
    }

    let batch_size = batch_size.max(1);
    let batches = chunks.len().div_ceil(batch_size);
    let mut store = VectorStore::new(embedder.model(), 0);

    for (n, batch) in chunks.chunks(batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        store.add(batch.to_vec(), vectors)?;

        if (n + 1) % 20 == 0 || n + 1 == batches {
            info!(batch = n + 1, batches, "Embedding progress");
        } else {
            debug!(batch = n + 1, batches, "Embedded batch");
        }
    }

    store.persist(db_path)?;

    let report = IndexReport {
        sampled_complaints: sample.len(),
        chunks: store.len(),
        dimensions: store.manifest().dimensions,
    };
    info!(
        path = %db_path.display(),
        sampled = report.sampled_complaints,
        chunks = report.chunks,
        "Vector store created"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::vector_search::tests::KeywordEmbedder;

    fn options(sample_size: usize) -> IndexConfig {
        IndexConfig {
            sample_size,
            sample_seed: 42,
            chunk_size: 40,
            chunk_overlap: 10,
        }
    }

    fn write_processed(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("filtered.csv");
        std::fs::write(
            &path,
            "Complaint ID,Product,Consumer complaint narrative,cleaned_narrative\n\
             11,Credit card,raw,the annual fee was charged twice and the late fee too\n\
             12,Credit card,raw,fee\n\
             13,Savings account,raw,my savings were frozen\n\
             14,Money transfer,raw,fraud\n",
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_create_vector_db_chunks_embeds_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_processed(dir.path());
        let db = dir.path().join("index");

        let report = create_vector_db(&input, &db, &options(100), &KeywordEmbedder, 2)
            .await
            .unwrap();

        assert_eq!(report.sampled_complaints, 4);
        assert_eq!(report.dimensions, 4);
        // the first narrative is longer than one chunk
        assert!(report.chunks > 4);

        let store = VectorStore::load(&db).unwrap();
        assert_eq!(store.len(), report.chunks);
        assert_eq!(store.manifest().embedding_model, "keyword-test");

        let hits = store.similarity_search(&[0.0, 1.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].chunk.metadata.complaint_id, "14");
        assert_eq!(hits[0].chunk.metadata.product, "Money transfer");
        assert_eq!(hits[0].chunk.metadata.chunk_index, 0);
    }

    #[tokio::test]
    async fn test_missing_complaint_id_column_uses_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("filtered.csv");
        std::fs::write(&input, "Product,cleaned_narrative\nPersonal loan,loan denied\n").unwrap();

        let db = dir.path().join("index");
        create_vector_db(&input, &db, &options(10), &KeywordEmbedder, 8)
            .await
            .unwrap();

        let store = VectorStore::load(&db).unwrap();
        let hits = store.similarity_search(&[0.0, 0.0, 0.0, 1.0], 1).unwrap();
        assert_eq!(hits[0].chunk.metadata.complaint_id, "N/A");
    }

    #[tokio::test]
    async fn test_missing_input_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_vector_db(
            &dir.path().join("nope.csv"),
            &dir.path().join("index"),
            &options(10),
            &KeywordEmbedder,
            8,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_dataset_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("filtered.csv");
        std::fs::write(&input, "Complaint ID,Product,cleaned_narrative\n").unwrap();

        let err = create_vector_db(&input, &dir.path().join("index"), &options(10), &KeywordEmbedder, 8)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn test_chunk_indices_restart_per_complaint() {
        let splitter = RecursiveTextSplitter::new(12, 0).unwrap();
        let complaints = vec![
            ProcessedComplaint {
                complaint_id: "1".into(),
                product: "Credit card".into(),
                narrative: "first chunk second chunk".into(),
            },
            ProcessedComplaint {
                complaint_id: "2".into(),
                product: "Personal loan".into(),
                narrative: "short".into(),
            },
        ];

        let chunks = chunk_complaints(&complaints, &splitter);
        let indices: Vec<(String, usize)> = chunks
            .iter()
            .map(|c| (c.metadata.complaint_id.clone(), c.metadata.chunk_index))
            .collect();
        assert_eq!(
            indices,
            vec![("1".into(), 0), ("1".into(), 1), ("1".into(), 2), ("2".into(), 0)]
        );
    }
}

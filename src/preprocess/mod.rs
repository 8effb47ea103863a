//! Complaint dataset preprocessing
//!
//! Filters the raw CFPB export down to the products the assistant covers,
//! drops complaints without a narrative and appends a normalised
//! `cleaned_narrative` column used by the indexer.

use crate::types::{AppError, AppResult};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

pub const PRODUCT_COLUMN: &str = "Product";
pub const NARRATIVE_COLUMN: &str = "Consumer complaint narrative";
pub const CLEANED_COLUMN: &str = "cleaned_narrative";
pub const COMPLAINT_ID_COLUMN: &str = "Complaint ID";

/// Product labels kept by the filter. CFPB renamed several products over
/// time, so both the old and new label of each product are listed.
pub const TARGET_PRODUCTS: [&str; 8] = [
    "Credit card",
    "Credit card or prepaid card",
    "Personal loan",
    "Payday loan, title loan, or personal loan",
    "Savings account",
    "Checking or savings account",
    "Money transfer",
    "Money transfer, virtual currency, or money service",
];

static BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"i am writing to file a complaint regarding|to whom it may concern")
        .expect("boilerplate pattern is valid")
});
static NON_LETTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z\s]").expect("letter pattern is valid"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Counters reported after a preprocessing run
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct PreprocessReport {
    pub total_rows: usize,
    pub product_matched: usize,
    pub empty_narratives_removed: usize,
    pub written: usize,
}

/// Normalise a complaint narrative for embedding.
pub fn clean_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let without_boilerplate = BOILERPLATE.replace_all(&lowered, "");
    let letters_only = NON_LETTERS.replace_all(&without_boilerplate, "");
    WHITESPACE.replace_all(&letters_only, " ").trim().to_string()
}

pub fn is_target_product(product: &str) -> bool {
    TARGET_PRODUCTS.contains(&product)
}

/// Look up a required column in a CSV header row
pub(crate) fn column_index(headers: &StringRecord, name: &str) -> AppResult<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| AppError::InvalidRequest(format!("Missing required column: {}", name)))
}

/// Filter and clean the raw complaints export, writing the result to `output_path`.
pub fn preprocess_complaints(input_path: &Path, output_path: &Path) -> AppResult<PreprocessReport> {
    if !input_path.exists() {
        return Err(AppError::NotFound(format!(
            "Raw data not found at {}",
            input_path.display()
        )));
    }

    info!(path = %input_path.display(), "Loading dataset");
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(input_path)?;

    let headers = reader.headers()?.clone();
    let product_idx = column_index(&headers, PRODUCT_COLUMN)?;
    let narrative_idx = column_index(&headers, NARRATIVE_COLUMN)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = WriterBuilder::new().from_path(output_path)?;
    let mut out_headers = headers.clone();
    out_headers.push_field(CLEANED_COLUMN);
    writer.write_record(&out_headers)?;

    let mut report = PreprocessReport::default();

    for record in reader.records() {
        let record = record?;
        report.total_rows += 1;

        let product = record.get(product_idx).unwrap_or_default();
        if !is_target_product(product) {
            continue;
        }
        report.product_matched += 1;

        let narrative = record.get(narrative_idx).unwrap_or_default();
        if narrative.trim().is_empty() {
            report.empty_narratives_removed += 1;
            continue;
        }

        let mut out = record.clone();
        out.push_field(&clean_text(narrative));
        writer.write_record(&out)?;
        report.written += 1;
    }

    writer.flush()?;

    info!(
        removed = report.empty_narratives_removed,
        "Removed rows with empty narratives"
    );
    debug!(
        total = report.total_rows,
        matched = report.product_matched,
        "Product filter applied"
    );
    info!(path = %output_path.display(), rows = report.written, "Processed data saved");

    Ok(report)
}

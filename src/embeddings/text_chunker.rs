//! Recursive character text splitting
//!
//! Splits on the coarsest separator present in the text (paragraphs, lines,
//! words, then characters), merges the pieces greedily up to `chunk_size`
//! characters and carries up to `chunk_overlap` characters of trailing
//! context into the next chunk.

use crate::types::{AppError, AppResult};
use tracing::warn;

pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        Self::with_separators(chunk_size, chunk_overlap, &DEFAULT_SEPARATORS)
    }

    pub fn with_separators(
        chunk_size: usize,
        chunk_overlap: usize,
        separators: &[&str],
    ) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::Config("chunk size must be positive".to_string()));
        }
        if chunk_overlap > chunk_size {
            return Err(AppError::Config(format!(
                "chunk overlap ({}) is larger than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: separators.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // Pick the first separator that occurs in the text; "" always matches.
        let mut separator = separators.last().cloned().unwrap_or_default();
        let mut remaining: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = String::new();
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep.clone();
                remaining = &separators[i + 1..];
                break;
            }
        }

        let splits = split_keeping_separator(text, &separator);

        // Separators are kept on the pieces, so merging joins with "".
        let mut good_splits: Vec<String> = Vec::new();
        for piece in splits {
            if char_len(&piece) < self.chunk_size {
                good_splits.push(piece);
            } else {
                if !good_splits.is_empty() {
                    final_chunks.extend(self.merge_splits(&good_splits, ""));
                    good_splits.clear();
                }
                if remaining.is_empty() {
                    final_chunks.push(piece);
                } else {
                    final_chunks.extend(self.split_recursive(&piece, remaining));
                }
            }
        }
        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits, ""));
        }

        final_chunks
    }

    fn merge_splits(&self, splits: &[String], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut total = 0usize;

        for piece in splits {
            let len = char_len(piece);
            let joined_len = |current: &Vec<&str>, total: usize| {
                total + len + if current.is_empty() { 0 } else { separator_len }
            };

            if joined_len(&current, total) > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        size = total,
                        limit = self.chunk_size,
                        "Created a chunk longer than the configured size"
                    );
                }
                if !current.is_empty() {
                    if let Some(doc) = join_pieces(&current, separator) {
                        docs.push(doc);
                    }
                    // Drop pieces from the front until only the overlap remains
                    // and the next piece fits.
                    while total > self.chunk_overlap
                        || (joined_len(&current, total) > self.chunk_size && total > 0)
                    {
                        let first_len = char_len(current[0]);
                        let sep = if current.len() > 1 { separator_len } else { 0 };
                        total -= first_len + sep;
                        current.remove(0);
                    }
                }
            }

            current.push(piece);
            total += len + if current.len() > 1 { separator_len } else { 0 };
        }

        if let Some(doc) = join_pieces(&current, separator) {
            docs.push(doc);
        }

        docs
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join_pieces(pieces: &[&str], separator: &str) -> Option<String> {
    let joined = pieces.join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split `text` on `separator`, attaching each separator to the start of the
/// piece that follows it. An empty separator splits into characters.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(|c| c.to_string()).collect();
    }

    let mut pieces = Vec::new();
    let mut parts = text.split(separator);
    if let Some(first) = parts.next() {
        if !first.is_empty() {
            pieces.push(first.to_string());
        }
    }
    for part in parts {
        pieces.push(format!("{}{}", separator, part));
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = RecursiveTextSplitter::new(500, 50).unwrap();
        let chunks = splitter.split_text("the bank charged me a late fee");
        assert_eq!(chunks, vec!["the bank charged me a late fee".to_string()]);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let splitter = RecursiveTextSplitter::new(500, 50).unwrap();
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text("   ").is_empty());
    }

    #[test]
    fn test_words_are_merged_with_overlap() {
        let splitter = RecursiveTextSplitter::new(10, 4).unwrap();
        let chunks = splitter.split_text("aaa bbb ccc ddd eee");
        assert_eq!(chunks, vec!["aaa bbb", "bbb ccc", "ccc ddd", "ddd eee"]);
    }

    #[test]
    fn test_chunks_respect_size_limit() {
        let splitter = RecursiveTextSplitter::new(500, 50).unwrap();
        let text = "my credit card was charged twice for the same purchase ".repeat(40);
        let chunks = splitter.split_text(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 500, "chunk too long: {}", chunk.len());
            assert_eq!(chunk.trim(), chunk);
        }
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let splitter = RecursiveTextSplitter::new(60, 20).unwrap();
        let text = (0..40).map(|i| format!("w{:02}", i)).collect::<Vec<_>>().join(" ");
        let chunks = splitter.split_text(&text);

        for pair in chunks.windows(2) {
            let last_word = pair[0].split(' ').last().unwrap();
            assert!(
                pair[1].contains(last_word),
                "no overlap between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_paragraphs_split_before_words() {
        let splitter = RecursiveTextSplitter::new(30, 0).unwrap();
        let chunks = splitter.split_text("first paragraph here\n\nsecond paragraph here");
        assert_eq!(chunks, vec!["first paragraph here", "second paragraph here"]);
    }

    #[test]
    fn test_unbroken_text_falls_back_to_characters() {
        let splitter = RecursiveTextSplitter::new(4, 0).unwrap();
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_multibyte_text_counts_characters() {
        let splitter = RecursiveTextSplitter::new(3, 0).unwrap();
        let chunks = splitter.split_text("ééééé");
        assert_eq!(chunks, vec!["ééé", "éé"]);
    }

    #[test]
    fn test_rejects_overlap_larger_than_size() {
        assert!(RecursiveTextSplitter::new(10, 11).is_err());
        assert!(RecursiveTextSplitter::new(0, 0).is_err());
    }

    #[test]
    fn test_split_keeping_separator() {
        assert_eq!(
            split_keeping_separator("a b c", " "),
            vec!["a".to_string(), " b".to_string(), " c".to_string()]
        );
        assert_eq!(
            split_keeping_separator(" a", " "),
            vec![" a".to_string()]
        );
    }
}

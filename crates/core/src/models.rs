use crate::error::ConfigError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_SNIPPET_CHARS: usize = 800;
pub const MIN_PASSAGE_CHARS: usize = 50;
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_MIN_SCORE: f32 = 0.6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub file_name: String,
    pub checksum: String,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub file_name: String,
    pub chunk_id: u32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub entry_id: String,
    pub vector: Vec<f32>,
    pub snippet: String,
    pub file_name: String,
}

impl IndexEntry {
    pub fn from_chunk(chunk: &ChunkRecord, vector: Vec<f32>) -> Self {
        Self {
            entry_id: format!("{}#{}", chunk.file_name, chunk.chunk_id),
            vector,
            snippet: truncate_chars(&chunk.text, MAX_SNIPPET_CHARS),
            file_name: chunk.file_name.clone(),
        }
    }
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredEntry {
    pub entry_id: String,
    pub score: f32,
    pub snippet: String,
    pub file_name: String,
}

#[derive(Debug, Clone)]
pub struct RetrievalQuery {
    pub text: String,
    pub top_k: usize,
    pub min_score: f32,
}

impl RetrievalQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            top_k: DEFAULT_TOP_K,
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub text: String,
    pub score: f32,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub query: String,
    pub passages: Vec<RetrievedPassage>,
}

impl RetrievalResult {
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IngestionOptions {
    pub chunk_max_chars: usize,
    pub chunk_overlap_chars: usize,
    pub min_chunk_chars: usize,
    pub min_document_chars: usize,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            chunk_max_chars: 1_000,
            chunk_overlap_chars: 100,
            min_chunk_chars: 100,
            min_document_chars: 200,
        }
    }
}

impl IngestionOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_max_chars == 0 {
            return Err(ConfigError::InvalidChunking(
                "chunk_max_chars must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap_chars >= self.chunk_max_chars {
            return Err(ConfigError::InvalidChunking(format!(
                "overlap {} must be less than chunk size {}",
                self.chunk_overlap_chars, self.chunk_max_chars
            )));
        }
        Ok(())
    }
}

use crate::chunking::{split_text, ChunkingConfig};
use crate::error::IngestError;
use crate::extractor::extract_document_text;
use crate::models::{ChunkRecord, IndexEntry, IngestionOptions, SourceDocument};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

#[derive(Debug)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug)]
pub struct IngestionReport {
    pub documents: Vec<SourceDocument>,
    pub chunks: Vec<ChunkRecord>,
    pub skipped: Vec<SkippedDocument>,
}

// Walks a folder of PDFs and turns each readable document into normalized
// chunk records. Per-document failures and too-short documents are skips,
// not errors; only configuration problems abort the batch.
pub fn ingest_folder(folder: &Path, options: IngestionOptions) -> Result<IngestionReport, IngestError> {
    options.validate()?;

    let files = discover_pdf_files(folder);
    if files.is_empty() {
        return Err(IngestError::NoDocuments(folder.display().to_string()));
    }

    let config = ChunkingConfig::from(options);
    let mut documents = Vec::new();
    let mut chunks = Vec::new();
    let mut skipped = Vec::new();

    for path in files {
        match ingest_document(&path, options, config) {
            Ok((document, document_chunks)) => {
                debug!(
                    file_name = %document.file_name,
                    chunk_count = document_chunks.len(),
                    "document chunked"
                );
                documents.push(document);
                chunks.extend(document_chunks);
            }
            Err(error) => {
                info!(path = %path.display(), reason = %error, "skipping document");
                skipped.push(SkippedDocument {
                    path,
                    reason: error.to_string(),
                });
            }
        }
    }

    Ok(IngestionReport {
        documents,
        chunks,
        skipped,
    })
}

// Pairs each chunk with its embedding row. The matrix is positionally
// coupled to the chunk list, so a length mismatch means the pair is stale.
pub fn build_index_entries(
    chunks: &[ChunkRecord],
    embeddings: Vec<Vec<f32>>,
) -> Result<Vec<IndexEntry>, IngestError> {
    if chunks.len() != embeddings.len() {
        return Err(IngestError::ArtifactMismatch(format!(
            "{} chunks but {} embedding rows",
            chunks.len(),
            embeddings.len()
        )));
    }

    Ok(chunks
        .iter()
        .zip(embeddings)
        .map(|(chunk, vector)| IndexEntry::from_chunk(chunk, vector))
        .collect())
}

fn ingest_document(
    path: &Path,
    options: IngestionOptions,
    config: ChunkingConfig,
) -> Result<(SourceDocument, Vec<ChunkRecord>), IngestError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?
        .to_string();

    let cleaned = extract_document_text(path)?;
    let cleaned_chars = cleaned.chars().count();
    if cleaned_chars < options.min_document_chars {
        return Err(IngestError::DocumentTooShort {
            got: cleaned_chars,
            minimum: options.min_document_chars,
        });
    }

    let document = SourceDocument {
        file_name: file_name.clone(),
        checksum: digest_file(path)?,
        ingested_at: Utc::now(),
    };

    let chunks = split_text(&cleaned, config)
        .into_iter()
        .enumerate()
        .map(|(index, text)| ChunkRecord {
            file_name: file_name.clone(),
            chunk_id: index as u32,
            text,
        })
        .collect();

    Ok((document, chunks))
}

use crate::embeddings::Embedder;
use crate::error::RetrievalError;
use crate::index::VectorIndex;
use crate::models::{
    ChunkRecord, IndexEntry, RetrievalQuery, RetrievalResult, RetrievedPassage, MIN_PASSAGE_CHARS,
};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Retriever<E, I>
where
    E: Embedder,
    I: VectorIndex,
{
    embedder: E,
    index: I,
    timeout: Duration,
}

impl<E, I> Retriever<E, I>
where
    E: Embedder + Send + Sync,
    I: VectorIndex + Send + Sync,
{
    pub fn new(embedder: E, index: I) -> Self {
        Self {
            embedder,
            index,
            timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    // Embed the chunks and upsert them into the index. Entry ids are
    // content-derived, so re-running is idempotent.
    pub async fn index_chunks(&self, chunks: &[ChunkRecord]) -> Result<usize, RetrievalError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
        let vectors = self.embedder.embed_batch(&texts);

        let entries: Vec<IndexEntry> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry::from_chunk(chunk, vector))
            .collect();

        self.index.upsert(&entries).await?;
        info!(entry_count = entries.len(), "indexed chunks");
        Ok(entries.len())
    }

    pub async fn retrieve(&self, query: &RetrievalQuery) -> Result<RetrievalResult, RetrievalError> {
        if query.text.trim().is_empty() {
            return Err(RetrievalError::EmptyQuery);
        }

        let vector = self.embedder.embed_query(&query.text);

        let hits = tokio::time::timeout(self.timeout, self.index.search(&vector, query.top_k))
            .await
            .map_err(|_| RetrievalError::Timeout(self.timeout))??;

        // Post-filter after ranking: the score floor drops weak matches and
        // the length floor drops near-empty boilerplate chunks. An empty
        // result is a valid outcome, not an error.
        let passages: Vec<RetrievedPassage> = hits
            .into_iter()
            .filter(|hit| {
                hit.score >= query.min_score
                    && hit.snippet.trim().chars().count() >= MIN_PASSAGE_CHARS
            })
            .map(|hit| RetrievedPassage {
                text: hit.snippet,
                score: hit.score,
                file_name: hit.file_name,
            })
            .collect();

        debug!(
            query = %query.text,
            passage_count = passages.len(),
            min_score = query.min_score,
            "retrieval complete"
        );

        Ok(RetrievalResult {
            query: query.text.clone(),
            passages,
        })
    }
}

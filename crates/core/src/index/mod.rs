use crate::error::{ConfigError, RetrievalError};
use crate::models::{IndexEntry, ScoredEntry};
use async_trait::async_trait;

pub mod memory;
pub mod pinecone;

pub use memory::ExactMemoryIndex;
pub use pinecone::PineconeIndex;

// Hosted backends cap the number of vectors per upsert call.
pub const UPSERT_BATCH_SIZE: usize = 100;

#[async_trait]
pub trait VectorIndex: Send + Sync {
    fn dimensions(&self) -> usize;

    // Idempotent: creating an index that already exists is a no-op.
    async fn ensure_index(&self) -> Result<(), RetrievalError>;

    // Idempotent by entry_id; the latest vector wins.
    async fn upsert(&self, entries: &[IndexEntry]) -> Result<(), RetrievalError>;

    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredEntry>, RetrievalError>;
}

pub(crate) fn check_dimensions(expected: usize, got: usize) -> Result<(), RetrievalError> {
    if expected != got {
        return Err(ConfigError::DimensionMismatch { expected, got }.into());
    }
    Ok(())
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

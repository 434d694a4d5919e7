use crate::error::RetrievalError;
use crate::index::{check_dimensions, cosine_similarity, VectorIndex};
use crate::models::{IndexEntry, ScoredEntry};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

// Exact brute-force cosine index. Fine for corpora up to a few hundred
// thousand vectors; everything stays in process memory.
#[derive(Debug)]
pub struct ExactMemoryIndex {
    dimensions: usize,
    entries: RwLock<BTreeMap<String, IndexEntry>>,
}

impl ExactMemoryIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl VectorIndex for ExactMemoryIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn ensure_index(&self) -> Result<(), RetrievalError> {
        Ok(())
    }

    async fn upsert(&self, entries: &[IndexEntry]) -> Result<(), RetrievalError> {
        // Validate the whole batch before touching the map so a bad entry
        // never leaves a partial write behind.
        for entry in entries {
            check_dimensions(self.dimensions, entry.vector.len())?;
        }

        let mut map = self.entries.write().await;
        for entry in entries {
            map.insert(entry.entry_id.clone(), entry.clone());
        }
        Ok(())
    }

    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredEntry>, RetrievalError> {
        check_dimensions(self.dimensions, vector.len())?;

        let map = self.entries.read().await;
        let mut scored: Vec<ScoredEntry> = map
            .values()
            .map(|entry| ScoredEntry {
                entry_id: entry.entry_id.clone(),
                score: cosine_similarity(&entry.vector, vector),
                snippet: entry.snippet.clone(),
                file_name: entry.file_name.clone(),
            })
            .collect();

        scored.sort_by(|left, right| {
            right
                .score
                .total_cmp(&left.score)
                .then_with(|| left.entry_id.cmp(&right.entry_id))
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}

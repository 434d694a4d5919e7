use crate::error::RetrievalError;
use crate::index::{check_dimensions, VectorIndex, UPSERT_BATCH_SIZE};
use crate::models::{IndexEntry, ScoredEntry};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

// Hosted vector index speaking the Pinecone REST protocol: the control
// plane provisions the index, the index host serves upserts and queries.
pub struct PineconeIndex {
    client: Client,
    api_key: String,
    control_endpoint: String,
    index_host: String,
    index_name: String,
    dimensions: usize,
}

impl PineconeIndex {
    pub fn new(
        control_endpoint: &str,
        index_host: &str,
        index_name: impl Into<String>,
        api_key: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self, RetrievalError> {
        Url::parse(control_endpoint)?;
        Url::parse(index_host)?;

        Ok(Self {
            client: Client::new(),
            api_key: api_key.into(),
            control_endpoint: control_endpoint.trim_end_matches('/').to_string(),
            index_host: index_host.trim_end_matches('/').to_string(),
            index_name: index_name.into(),
            dimensions,
        })
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn ensure_index(&self) -> Result<(), RetrievalError> {
        let response = self
            .client
            .post(format!("{}/indexes", self.control_endpoint))
            .header("Api-Key", &self.api_key)
            .json(&json!({
                "name": self.index_name,
                "dimension": self.dimensions,
                "metric": "cosine",
                "spec": { "serverless": { "cloud": "aws", "region": "us-east-1" } },
            }))
            .send()
            .await?;

        // An index that already exists by this name is fine.
        if response.status() == StatusCode::CONFLICT {
            debug!(index = %self.index_name, "index already exists");
            return Ok(());
        }

        if !response.status().is_success() {
            return Err(RetrievalError::BackendResponse {
                backend: "pinecone".to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(())
    }

    async fn upsert(&self, entries: &[IndexEntry]) -> Result<(), RetrievalError> {
        // Validate every vector before the first network call so a bad
        // entry cannot leave a partially written batch behind.
        for entry in entries {
            check_dimensions(self.dimensions, entry.vector.len())?;
        }

        let mut uploaded = 0usize;
        for batch in entries.chunks(UPSERT_BATCH_SIZE) {
            let response = self
                .client
                .post(format!("{}/vectors/upsert", self.index_host))
                .header("Api-Key", &self.api_key)
                .json(&upsert_payload(batch))
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(RetrievalError::BackendResponse {
                    backend: "pinecone".to_string(),
                    details: response.status().to_string(),
                });
            }

            uploaded += batch.len();
            debug!(uploaded, total = entries.len(), "upserted batch");
        }

        Ok(())
    }

    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredEntry>, RetrievalError> {
        check_dimensions(self.dimensions, vector.len())?;

        let response = self
            .client
            .post(format!("{}/query", self.index_host))
            .header("Api-Key", &self.api_key)
            .json(&json!({
                "vector": vector,
                "topK": top_k,
                "includeMetadata": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RetrievalError::BackendResponse {
                backend: "pinecone".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        Ok(parse_matches(&parsed))
    }
}

fn upsert_payload(batch: &[IndexEntry]) -> Value {
    let vectors = batch
        .iter()
        .map(|entry| {
            json!({
                "id": entry.entry_id,
                "values": entry.vector,
                "metadata": {
                    "text": entry.snippet,
                    "file_name": entry.file_name,
                },
            })
        })
        .collect::<Vec<_>>();

    json!({ "vectors": vectors })
}

fn parse_matches(response: &Value) -> Vec<ScoredEntry> {
    let matches = response
        .pointer("/matches")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut hits = Vec::new();
    for hit in matches {
        let entry_id = hit
            .pointer("/id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let score = hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0) as f32;
        let snippet = hit
            .pointer("/metadata/text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let file_name = hit
            .pointer("/metadata/file_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        hits.push(ScoredEntry {
            entry_id,
            score,
            snippet,
            file_name,
        });
    }

    // Backend order is already score-descending; re-sort with the entry_id
    // tie-break so results stay reproducible.
    hits.sort_by(|left, right| {
        right
            .score
            .total_cmp(&left.score)
            .then_with(|| left.entry_id.cmp(&right.entry_id))
    });
    hits
}

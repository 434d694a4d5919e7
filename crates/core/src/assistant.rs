use crate::embeddings::Embedder;
use crate::error::RetrievalError;
use crate::formatter::{format_context, DEFAULT_CONTEXT_BUDGET, INSUFFICIENT_INFORMATION};
use crate::index::VectorIndex;
use crate::models::{RetrievalQuery, RetrievedPassage};
use crate::retriever::Retriever;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, RetrievalError>;
}

pub struct OpenAiChatClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OpenAiChatClient {
    pub fn new(endpoint: &str, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.2,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[async_trait]
impl GenerationClient for OpenAiChatClient {
    async fn generate(&self, prompt: &str) -> Result<String, RetrievalError> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RetrievalError::BackendResponse {
                backend: "openai".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        parsed
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| RetrievalError::Generation("response had no message content".to_string()))
    }
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a legal research assistant.\n\
         Use only the provided context to answer questions clearly and concisely.\n\
         Always cite the section number or case name you relied on.\n\
         If unsure, say you are not certain and recommend consulting a lawyer.\n\n\
         Context:\n{context}\n\n\
         Question:\n{question}\n\n\
         Answer:"
    )
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub passages: Vec<RetrievedPassage>,
}

// The single seam the presentation layer depends on: retrieve, format,
// generate.
pub struct LegalAssistant<E, I, G>
where
    E: Embedder,
    I: VectorIndex,
    G: GenerationClient,
{
    retriever: Retriever<E, I>,
    generator: G,
    context_budget: usize,
}

impl<E, I, G> LegalAssistant<E, I, G>
where
    E: Embedder + Send + Sync,
    I: VectorIndex + Send + Sync,
    G: GenerationClient,
{
    pub fn new(retriever: Retriever<E, I>, generator: G) -> Self {
        Self {
            retriever,
            generator,
            context_budget: DEFAULT_CONTEXT_BUDGET,
        }
    }

    pub fn with_context_budget(mut self, context_budget: usize) -> Self {
        self.context_budget = context_budget;
        self
    }

    pub async fn answer(&self, query: &RetrievalQuery) -> Result<Answer, RetrievalError> {
        let retrieved = self.retriever.retrieve(query).await?;

        if retrieved.is_empty() {
            info!(query = %query.text, "no passages cleared the relevance filter");
            return Ok(Answer {
                text: INSUFFICIENT_INFORMATION.to_string(),
                passages: Vec::new(),
            });
        }

        let context = format_context(&retrieved.passages, self.context_budget);
        debug!(
            passage_count = retrieved.passages.len(),
            context_chars = context.chars().count(),
            "prompting generation"
        );

        let text = self
            .generator
            .generate(&build_prompt(&context, &query.text))
            .await?;

        Ok(Answer {
            text,
            passages: retrieved.passages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingTrigramEmbedder;
    use crate::index::ExactMemoryIndex;
    use crate::models::{ChunkRecord, RetrievalQuery};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct RecordingGenerator {
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl GenerationClient for RecordingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, RetrievalError> {
            self.called.store(true, Ordering::SeqCst);
            assert!(prompt.contains("Context:"));
            Ok("Theft is defined by Section 378.".to_string())
        }
    }

    async fn assistant_over(
        chunks: Vec<ChunkRecord>,
        called: Arc<AtomicBool>,
    ) -> LegalAssistant<HashingTrigramEmbedder, ExactMemoryIndex, RecordingGenerator> {
        let embedder = HashingTrigramEmbedder::default();
        let index = ExactMemoryIndex::new(embedder.dimensions());
        let retriever = Retriever::new(embedder, index);
        retriever.index_chunks(&chunks).await.unwrap();

        LegalAssistant::new(retriever, RecordingGenerator { called })
    }

    #[tokio::test]
    async fn empty_index_short_circuits_without_a_generation_call() {
        let called = Arc::new(AtomicBool::new(false));
        let assistant = assistant_over(Vec::new(), called.clone()).await;

        let answer = assistant
            .answer(&RetrievalQuery::new("What is theft?"))
            .await
            .unwrap();

        assert_eq!(answer.text, INSUFFICIENT_INFORMATION);
        assert!(answer.passages.is_empty());
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn grounded_question_reaches_generation_with_context() {
        let called = Arc::new(AtomicBool::new(false));
        let chunk_text = format!(
            "Section 378 defines theft of movable property. {}",
            "Whoever intends to take dishonestly any movable property is said to commit theft. "
                .repeat(2)
        );
        let assistant = assistant_over(
            vec![ChunkRecord {
                file_name: "ipc.pdf".to_string(),
                chunk_id: 0,
                text: chunk_text,
            }],
            called.clone(),
        )
        .await;

        let mut query = RetrievalQuery::new("What is theft?");
        query.min_score = 0.0;
        let answer = assistant.answer(&query).await.unwrap();

        assert!(called.load(Ordering::SeqCst));
        assert!(answer.text.contains("Section 378"));
        assert_eq!(answer.passages.len(), 1);
        assert_eq!(answer.passages[0].file_name, "ipc.pdf");
    }

    #[tokio::test]
    async fn blank_questions_are_a_validation_failure() {
        let called = Arc::new(AtomicBool::new(false));
        let embedder = HashingTrigramEmbedder::default();
        let index = ExactMemoryIndex::new(embedder.dimensions());
        let assistant = LegalAssistant::new(
            Retriever::new(embedder, index),
            RecordingGenerator {
                called: called.clone(),
            },
        );

        let result = assistant.answer(&RetrievalQuery::new("  ")).await;
        assert!(matches!(result, Err(RetrievalError::EmptyQuery)));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn prompt_carries_context_and_question() {
        let prompt = build_prompt("[ipc.pdf]\nSection 378", "What is theft?");
        assert!(prompt.contains("[ipc.pdf]"));
        assert!(prompt.contains("What is theft?"));
        assert!(prompt.starts_with("You are a legal research assistant."));
    }
}

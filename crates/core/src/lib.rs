pub mod artifacts;
pub mod assistant;
pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod formatter;
pub mod index;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod retriever;

pub use artifacts::{
    load_artifacts, read_chunk_table, read_embedding_matrix, write_artifacts, write_chunk_table,
    write_embedding_matrix, CHUNK_TABLE_FILE, EMBEDDING_MATRIX_FILE,
};
pub use assistant::{build_prompt, Answer, GenerationClient, LegalAssistant, OpenAiChatClient};
pub use chunking::{split_text, ChunkingConfig, SEPARATORS};
pub use config::{OpenAiSettings, PineconeSettings, Settings};
pub use embeddings::{
    l2_normalize, Embedder, HashingTrigramEmbedder, DEFAULT_EMBEDDING_DIMENSIONS,
};
pub use error::{ConfigError, IngestError, RetrievalError};
pub use extractor::{extract_document_text, LopdfExtractor, PageText, PdfExtractor};
pub use formatter::{format_context, DEFAULT_CONTEXT_BUDGET, INSUFFICIENT_INFORMATION};
pub use index::{ExactMemoryIndex, PineconeIndex, VectorIndex, UPSERT_BATCH_SIZE};
pub use ingest::{
    build_index_entries, digest_file, discover_pdf_files, ingest_folder, IngestionReport,
    SkippedDocument,
};
pub use models::{
    ChunkRecord, IndexEntry, IngestionOptions, RetrievalQuery, RetrievalResult, RetrievedPassage,
    ScoredEntry, SourceDocument, DEFAULT_MIN_SCORE, DEFAULT_TOP_K, MAX_SNIPPET_CHARS,
    MIN_PASSAGE_CHARS,
};
pub use normalize::clean_text;
pub use retriever::{Retriever, DEFAULT_SEARCH_TIMEOUT};

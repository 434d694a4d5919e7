use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    #[error("vector dimension {got} does not match index dimension {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("invalid chunking options: {0}")]
    InvalidChunking(String),

    #[error("invalid setting {name}: {details}")]
    InvalidSetting { name: &'static str, details: String },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("document too short after cleaning: {got} chars, minimum {minimum}")]
    DocumentTooShort { got: usize, minimum: usize },

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("no pdf files found in {0}")]
    NoDocuments(String),

    #[error("coupled artifacts disagree: {0}")]
    ArtifactMismatch(String),

    #[error("malformed chunk table: {0}")]
    MalformedChunkTable(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("search timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

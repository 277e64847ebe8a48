use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding service returned {status}: {body}")]
    UnexpectedStatus { status: String, body: String },

    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),

    #[error("input text is empty")]
    EmptyInput,
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("index request failed: {0}")]
    Request(String),
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("field {0} is missing or empty")]
    MissingOrEmpty(&'static str),

    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("timestamp {0} is out of range")]
    Timestamp(i64),

    #[error("embedding has no vectors")]
    EmptyEmbedding,

    #[error("embedding vectors have mixed dimensions")]
    MixedDimensions,
}

#[derive(Debug, Error)]
#[error("retries exhausted after {attempts} attempts on {operation}")]
pub struct RetriesExhausted {
    pub operation: String,
    pub attempts: u32,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Retry(#[from] RetriesExhausted),

    #[error("search request failed: {0}")]
    Request(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Retry(#[from] RetriesExhausted),
}

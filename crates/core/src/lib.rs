pub mod embedding;
pub mod error;
pub mod ingest;
pub mod models;
pub mod retry;
pub mod search;
pub mod stores;
pub mod traits;

pub use embedding::{
    Embedder, EmbeddingMode, HashedTokenEmbedder, JinaEmbedder, DEFAULT_EMBEDDING_DIMENSIONS,
};
pub use error::{
    EmbeddingError, IndexError, IngestError, RecordError, RetriesExhausted, SearchError,
};
pub use ingest::{
    parse_faq_jsonl, read_faq_jsonl, IngestReport, IngestionPipeline, SkippedLine, SkippedRecord,
    SourceReport,
};
pub use models::{
    epoch_to_source_time, format_payload_date, EmbeddedFaq, FaqRecord, FaqSearchResult,
    IndexPoint, MultiVector, ScoredPoint,
};
pub use retry::{retry, retry_unit, DEFAULT_MAX_ATTEMPTS};
pub use search::SearchPipeline;
pub use stores::{InMemoryIndex, QdrantStore};
pub use traits::VectorIndex;

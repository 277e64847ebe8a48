use crate::embedding::{Embedder, EmbeddingMode};
use crate::error::SearchError;
use crate::models::FaqSearchResult;
use crate::retry::{retry, DEFAULT_MAX_ATTEMPTS};
use crate::traits::VectorIndex;

pub struct SearchPipeline<E, V> {
    embedder: E,
    index: V,
    max_attempts: u32,
}

impl<E, V> SearchPipeline<E, V>
where
    E: Embedder + Send + Sync,
    V: VectorIndex + Send + Sync,
{
    pub fn new(embedder: E, index: V) -> Self {
        Self {
            embedder,
            index,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    // An empty result list is a successful "no match", never an error.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        collection: &str,
    ) -> Result<Vec<FaqSearchResult>, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::Request("query is empty".to_string()));
        }

        let embedding = retry(
            || self.embedder.embed(query, EmbeddingMode::Query),
            self.max_attempts,
            "embed search query",
        )
        .await?;

        let hits = retry(
            || self.index.query_nearest(collection, &embedding, top_k),
            self.max_attempts,
            "query faq collection",
        )
        .await?;

        // The index already returns rank order; map payloads through as-is.
        Ok(hits.into_iter().map(FaqSearchResult::from).collect())
    }
}

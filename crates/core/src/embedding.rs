use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::EmbeddingError;
use crate::models::MultiVector;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 128;

const DEFAULT_ENDPOINT: &str = "https://api.jina.ai/v1/multi-vector";
const DEFAULT_MODEL: &str = "jina-colbert-v2";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingMode {
    Query,
    Document,
}

impl EmbeddingMode {
    pub fn input_type(self) -> &'static str {
        match self {
            EmbeddingMode::Query => "query",
            EmbeddingMode::Document => "document",
        }
    }
}

#[async_trait]
pub trait Embedder {
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str, mode: EmbeddingMode) -> Result<MultiVector, EmbeddingError>;
}

#[async_trait]
impl<T> Embedder for &T
where
    T: Embedder + Sync,
{
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    async fn embed(&self, text: &str, mode: EmbeddingMode) -> Result<MultiVector, EmbeddingError> {
        (**self).embed(text, mode).await
    }
}

pub struct JinaEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    dimensions: usize,
}

impl JinaEmbedder {
    pub fn new(api_key: impl Into<String>) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl Embedder for JinaEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str, mode: EmbeddingMode) -> Result<MultiVector, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let body = json!({
            "input": [text],
            "model": self.model,
            "dimensions": self.dimensions,
            "embedding_type": "float",
            "input_type": mode.input_type(),
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::UnexpectedStatus {
                status: status.to_string(),
                body,
            });
        }

        let raw = response.text().await?;
        parse_multivector_response(&raw)
    }
}

// Per-token vector order is preserved exactly as returned; the index computes
// the similarity, nothing is recomputed locally.
pub fn parse_multivector_response(body: &str) -> Result<MultiVector, EmbeddingError> {
    let parsed: Value = serde_json::from_str(body)
        .map_err(|error| EmbeddingError::MalformedResponse(error.to_string()))?;

    let rows = parsed
        .pointer("/data/0/embeddings")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            EmbeddingError::MalformedResponse("missing data[0].embeddings".to_string())
        })?;

    let mut vectors = Vec::with_capacity(rows.len());
    for row in rows {
        let row = row.as_array().ok_or_else(|| {
            EmbeddingError::MalformedResponse("embedding row is not an array".to_string())
        })?;

        let mut vector = Vec::with_capacity(row.len());
        for value in row {
            let value = value.as_f64().ok_or_else(|| {
                EmbeddingError::MalformedResponse("embedding value is not a number".to_string())
            })?;
            vector.push(value as f32);
        }
        vectors.push(vector);
    }

    MultiVector::new(vectors).map_err(|error| EmbeddingError::MalformedResponse(error.to_string()))
}

#[derive(Debug, Clone, Copy)]
pub struct HashedTokenEmbedder {
    pub dimensions: usize,
}

impl Default for HashedTokenEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

impl HashedTokenEmbedder {
    fn token_vector(&self, token: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let chars: Vec<char> = token.chars().collect();

        if chars.len() < 3 {
            let bucket = (fnv(token) % vector.len() as u64) as usize;
            vector[bucket] = 1.0;
            return vector;
        }

        for window in chars.windows(3) {
            let trigram = window.iter().collect::<String>();
            let bucket = (fnv(&trigram) % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

#[async_trait]
impl Embedder for HashedTokenEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str, _mode: EmbeddingMode) -> Result<MultiVector, EmbeddingError> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();
        if tokens.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let vectors = tokens
            .iter()
            .map(|token| self.token_vector(token))
            .collect();

        MultiVector::new(vectors)
            .map_err(|error| EmbeddingError::MalformedResponse(error.to_string()))
    }
}

fn fnv(token: &str) -> u64 {
    let mut hash = 1469598103934665603u64;
    for byte in token.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::{
        parse_multivector_response, Embedder, EmbeddingMode, HashedTokenEmbedder,
        DEFAULT_EMBEDDING_DIMENSIONS,
    };
    use crate::error::EmbeddingError;

    #[test]
    fn mode_maps_to_wire_input_type() {
        assert_eq!(EmbeddingMode::Query.input_type(), "query");
        assert_eq!(EmbeddingMode::Document.input_type(), "document");
    }

    #[test]
    fn parses_nested_embedding_arrays_in_order() {
        let body = r#"{"data":[{"embeddings":[[0.5,-0.25],[1.0,2.0],[0.125,4.0]]}]}"#;
        let embedding = parse_multivector_response(body).expect("well-formed body");

        assert_eq!(embedding.len(), 3);
        assert_eq!(embedding.dimensions(), 2);
        assert_eq!(embedding.vectors()[1], vec![1.0, 2.0]);
    }

    #[test]
    fn rejects_body_without_embeddings() {
        let body = r#"{"data":[{"values":[1.0]}]}"#;
        let result = parse_multivector_response(body);
        assert!(matches!(result, Err(EmbeddingError::MalformedResponse(_))));
    }

    #[test]
    fn rejects_non_numeric_embedding_values() {
        let body = r#"{"data":[{"embeddings":[["a","b"]]}]}"#;
        let result = parse_multivector_response(body);
        assert!(matches!(result, Err(EmbeddingError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn hashed_embedder_emits_one_vector_per_token() {
        let embedder = HashedTokenEmbedder::default();
        let embedding = embedder
            .embed("How do I reset my password", EmbeddingMode::Query)
            .await
            .expect("non-empty input");

        assert_eq!(embedding.len(), 6);
        assert_eq!(embedding.dimensions(), DEFAULT_EMBEDDING_DIMENSIONS);
    }

    #[tokio::test]
    async fn hashed_embedder_is_deterministic() {
        let embedder = HashedTokenEmbedder::default();
        let first = embedder
            .embed("Reset password", EmbeddingMode::Document)
            .await
            .expect("non-empty input");
        let second = embedder
            .embed("Reset password", EmbeddingMode::Document)
            .await
            .expect("non-empty input");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn hashed_embedder_rejects_blank_input() {
        let embedder = HashedTokenEmbedder::default();
        let result = embedder.embed("   ", EmbeddingMode::Query).await;
        assert!(matches!(result, Err(EmbeddingError::EmptyInput)));
    }
}

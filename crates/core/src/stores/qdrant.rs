use crate::error::IndexError;
use crate::models::{IndexPoint, MultiVector, ScoredPoint};
use crate::traits::VectorIndex;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub struct QdrantStore {
    endpoint: String,
    client: Client,
    vector_size: usize,
}

impl QdrantStore {
    pub fn new(endpoint: impl Into<String>, vector_size: usize) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::new(),
            vector_size,
        }
    }

    fn backend_error(details: impl Into<String>) -> IndexError {
        IndexError::BackendResponse {
            backend: "qdrant".to_string(),
            details: details.into(),
        }
    }
}

#[async_trait]
impl VectorIndex for QdrantStore {
    async fn create_multivector_collection(&self, name: &str) -> Result<(), IndexError> {
        let response = self
            .client
            .put(format!("{}/collections/{}", self.endpoint, name))
            .json(&json!({
                "vectors": {
                    "size": self.vector_size,
                    "distance": "Dot",
                    "multivector_config": { "comparator": "max_sim" },
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::backend_error(response.status().to_string()));
        }

        Ok(())
    }

    async fn upsert(&self, collection: &str, points: &[IndexPoint]) -> Result<(), IndexError> {
        if points.is_empty() {
            return Ok(());
        }

        let body_points = points
            .iter()
            .map(|point| {
                if point.vector.dimensions() != self.vector_size {
                    return Err(IndexError::Request(format!(
                        "point {} dimension {} is not {}",
                        point.id,
                        point.vector.dimensions(),
                        self.vector_size
                    )));
                }

                Ok(json!({
                    "id": point.id,
                    "vector": point.vector.vectors(),
                    "payload": point.payload,
                }))
            })
            .collect::<Result<Vec<_>, IndexError>>()?;

        let response = self
            .client
            .put(format!(
                "{}/collections/{}/points?wait=true",
                self.endpoint, collection
            ))
            .json(&json!({ "points": body_points }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::backend_error(response.status().to_string()));
        }

        Ok(())
    }

    async fn query_nearest(
        &self,
        collection: &str,
        query: &MultiVector,
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>, IndexError> {
        if top_k == 0 {
            return Err(IndexError::Request("top_k must be positive".to_string()));
        }
        if query.dimensions() != self.vector_size {
            return Err(IndexError::Request(format!(
                "query vector dim {} is not {}",
                query.dimensions(),
                self.vector_size
            )));
        }

        let response = self
            .client
            .post(format!(
                "{}/collections/{}/points/query",
                self.endpoint, collection
            ))
            .json(&json!({
                "query": query.vectors(),
                "limit": top_k,
                "with_payload": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::backend_error(response.status().to_string()));
        }

        let parsed: Value = response.json().await?;
        let hits = parsed
            .pointer("/result/points")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut result = Vec::new();
        for hit in hits {
            let score = hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0);

            let mut payload = BTreeMap::new();
            if let Some(fields) = hit.pointer("/payload").and_then(Value::as_object) {
                for (key, value) in fields {
                    if let Some(text) = value.as_str() {
                        payload.insert(key.clone(), text.to_string());
                    }
                }
            }

            result.push(ScoredPoint { payload, score });
        }

        Ok(result)
    }
}

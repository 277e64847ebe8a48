use async_trait::async_trait;

use crate::error::IndexError;
use crate::models::{IndexPoint, MultiVector, ScoredPoint};

#[async_trait]
pub trait VectorIndex {
    async fn create_multivector_collection(&self, name: &str) -> Result<(), IndexError>;

    // Idempotent per point id; partial application on failure is possible and
    // is not rolled back.
    async fn upsert(&self, collection: &str, points: &[IndexPoint]) -> Result<(), IndexError>;

    // At most top_k points in descending score order. Ties keep backend order,
    // which is not deterministic.
    async fn query_nearest(
        &self,
        collection: &str,
        query: &MultiVector,
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>, IndexError>;
}

#[async_trait]
impl<T> VectorIndex for &T
where
    T: VectorIndex + Sync,
{
    async fn create_multivector_collection(&self, name: &str) -> Result<(), IndexError> {
        (**self).create_multivector_collection(name).await
    }

    async fn upsert(&self, collection: &str, points: &[IndexPoint]) -> Result<(), IndexError> {
        (**self).upsert(collection, points).await
    }

    async fn query_nearest(
        &self,
        collection: &str,
        query: &MultiVector,
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>, IndexError> {
        (**self).query_nearest(collection, query, top_k).await
    }
}

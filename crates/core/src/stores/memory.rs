use crate::error::IndexError;
use crate::models::{IndexPoint, MultiVector, ScoredPoint};
use crate::traits::VectorIndex;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

type Collections = HashMap<String, BTreeMap<u64, StoredPoint>>;

#[derive(Default)]
pub struct InMemoryIndex {
    collections: Mutex<Collections>,
}

#[derive(Clone)]
struct StoredPoint {
    vector: MultiVector,
    payload: BTreeMap<String, String>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, IndexError> {
        self.collections
            .lock()
            .map_err(|_| IndexError::Request("index mutex poisoned".to_string()))
    }
}

// Late-interaction score: for each query vector, the best dot product against
// any stored vector; summed over the query vectors.
fn max_sim(query: &MultiVector, stored: &MultiVector) -> f64 {
    let mut total = 0.0f64;
    for query_vector in query.vectors() {
        let mut best = f64::NEG_INFINITY;
        for stored_vector in stored.vectors() {
            let dot = query_vector
                .iter()
                .zip(stored_vector)
                .map(|(a, b)| f64::from(a * b))
                .sum::<f64>();
            if dot > best {
                best = dot;
            }
        }
        total += best;
    }
    total
}

fn missing(collection: &str) -> IndexError {
    IndexError::Request(format!("collection {collection} does not exist"))
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn create_multivector_collection(&self, name: &str) -> Result<(), IndexError> {
        let mut collections = self.lock()?;
        if collections.contains_key(name) {
            return Err(IndexError::Request(format!(
                "collection {name} already exists"
            )));
        }
        collections.insert(name.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: &[IndexPoint]) -> Result<(), IndexError> {
        let mut collections = self.lock()?;
        let stored = collections
            .get_mut(collection)
            .ok_or_else(|| missing(collection))?;

        for point in points {
            stored.insert(
                point.id,
                StoredPoint {
                    vector: point.vector.clone(),
                    payload: point.payload.clone(),
                },
            );
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

        let collections = self.lock()?;
        let stored = collections
            .get(collection)
            .ok_or_else(|| missing(collection))?;

        let mut scored: Vec<ScoredPoint> = stored
            .values()
            .map(|point| ScoredPoint {
                payload: point.payload.clone(),
                score: max_sim(query, &point.vector),
            })
            .collect();

        scored.sort_by(|left, right| right.score.total_cmp(&left.score));
        scored.truncate(top_k);
        Ok(scored)
    }
}

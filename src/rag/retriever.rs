//! Similarity retrieval over the course store.

use std::sync::Arc;
use std::time::Duration;

use crate::catalog::types::CourseRecord;
use crate::core::errors::ApiError;
use crate::llm::EmbeddingProvider;

use super::store::CourseStore;

/// Score assigned when the backend reports none. All results share it, so
/// no reordering is implied.
pub const SENTINEL_SCORE: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct RetrievedDoc {
    pub record: CourseRecord,
    pub score: f32,
}

pub struct Retriever {
    embeddings: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn CourseStore>,
    timeout: Duration,
}

impl Retriever {
    pub fn new(
        embeddings: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn CourseStore>,
        timeout: Duration,
    ) -> Self {
        Retriever {
            embeddings,
            store,
            timeout,
        }
    }

    /// Top-`top_k` course records for `query`, descending by score. Ties
    /// keep the store's order (stable sort).
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedDoc>, ApiError> {
        let inputs = [query.to_string()];
        let embed = self.embeddings.embed(&inputs);
        let mut vectors = tokio::time::timeout(self.timeout, embed)
            .await
            .map_err(|_| ApiError::Internal("query embedding timed out".to_string()))??;

        let query_embedding = vectors
            .pop()
            .ok_or_else(|| ApiError::Internal("embedding backend returned nothing".to_string()))?;

        let search = self.store.search(&query_embedding, top_k);
        let hits = tokio::time::timeout(self.timeout, search)
            .await
            .map_err(|_| ApiError::Internal("similarity search timed out".to_string()))??;

        let mut docs: Vec<RetrievedDoc> = hits
            .into_iter()
            .map(|hit| RetrievedDoc {
                record: hit.record,
                score: hit.score.unwrap_or(SENTINEL_SCORE),
            })
            .collect();

        docs.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        docs.truncate(top_k);

        Ok(docs)
    }
}

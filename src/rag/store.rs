//! CourseStore, the abstract interface for the persistent record store.
//!
//! The store keeps one document per course, keyed by the resolved id, with
//! the embedding used for similarity search. Ingestion writes through
//! `set`/`batch_set`/`add`; the interactive path only searches.

use async_trait::async_trait;

use crate::catalog::types::CourseRecord;
use crate::core::errors::ApiError;

/// One search result. `score` is `None` when the backend exposes no usable
/// similarity score; the retriever substitutes a sentinel in that case.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub record: CourseRecord,
    pub score: Option<f32>,
}

#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Stores a record under an explicit id. Re-ingesting replaces.
    async fn set(
        &self,
        id: &str,
        record: &CourseRecord,
        embedding: &[f32],
    ) -> Result<(), ApiError>;

    async fn get(&self, id: &str) -> Result<Option<CourseRecord>, ApiError>;

    /// Stores a record under a generated id and returns it. Used when the
    /// sanitized id would be empty.
    async fn add(&self, record: &CourseRecord, embedding: &[f32]) -> Result<String, ApiError>;

    async fn batch_set(
        &self,
        items: &[(String, CourseRecord, Vec<f32>)],
    ) -> Result<(), ApiError>;

    /// All stored ids; ingestion preloads these so duplicate resolution
    /// also sees what earlier runs wrote.
    async fn list_ids(&self) -> Result<Vec<String>, ApiError>;

    /// Top-`limit` records by similarity to `query_embedding`, best first.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>, ApiError>;
}

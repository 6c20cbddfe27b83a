//! SQLite-backed course store.
//!
//! In-process vector store: course fields as columns, the embedding as a
//! little-endian f32 blob, and brute-force cosine similarity for search.
//! The catalog is a few thousand rows, so a full scan per query is cheap.

use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};

use super::store::{CourseStore, SearchHit};
use crate::catalog::types::{College, CourseRecord};
use crate::core::errors::ApiError;

pub struct SqliteCourseStore {
    pool: SqlitePool,
}

impl SqliteCourseStore {
    pub async fn new(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS courses (
                id TEXT PRIMARY KEY,
                college TEXT NOT NULL,
                category TEXT NOT NULL,
                number TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                tag TEXT NOT NULL DEFAULT '',
                pre_reqs TEXT NOT NULL DEFAULT '',
                embedding BLOB,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    /// Cosine similarity clamped to [0, 1]: orthogonal-or-worse counts as
    /// irrelevant rather than negatively relevant.
    fn similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            (dot / denom).clamp(0.0, 1.0)
        }
    }

    fn row_to_record(row: &SqliteRow) -> CourseRecord {
        let college: String = row.get("college");
        CourseRecord {
            college: College::from_str(&college).unwrap_or(College::Cas),
            category: row.get("category"),
            number: row.get("number"),
            title: row.get("title"),
            description: row.get("description"),
            tag: row.get("tag"),
            pre_reqs: row.get("pre_reqs"),
        }
    }

    async fn upsert(
        &self,
        id: &str,
        record: &CourseRecord,
        embedding: &[f32],
        executor: &mut sqlx::SqliteConnection,
    ) -> Result<(), ApiError> {
        let blob = Self::serialize_embedding(embedding);

        sqlx::query(
            "INSERT OR REPLACE INTO courses
                 (id, college, category, number, title, description, tag, pre_reqs, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(id)
        .bind(record.college.as_str())
        .bind(&record.category)
        .bind(&record.number)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.tag)
        .bind(&record.pre_reqs)
        .bind(&blob)
        .execute(executor)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }
}

#[async_trait]
impl CourseStore for SqliteCourseStore {
    async fn set(
        &self,
        id: &str,
        record: &CourseRecord,
        embedding: &[f32],
    ) -> Result<(), ApiError> {
        let mut conn = self.pool.acquire().await.map_err(ApiError::internal)?;
        self.upsert(id, record, embedding, &mut conn).await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<CourseRecord>, ApiError> {
        let row = sqlx::query("SELECT * FROM courses WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(row.as_ref().map(Self::row_to_record))
    }

    async fn add(&self, record: &CourseRecord, embedding: &[f32]) -> Result<String, ApiError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.set(&id, record, embedding).await?;
        Ok(id)
    }

    async fn batch_set(
        &self,
        items: &[(String, CourseRecord, Vec<f32>)],
    ) -> Result<(), ApiError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;
        for (id, record, embedding) in items {
            self.upsert(id, record, embedding, &mut tx).await?;
        }
        tx.commit().await.map_err(ApiError::internal)?;

        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<String>, ApiError> {
        let rows = sqlx::query("SELECT id FROM courses")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>, ApiError> {
        let rows = sqlx::query("SELECT * FROM courses")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        let mut scored: Vec<SearchHit> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored = Self::deserialize_embedding(&embedding_bytes);
                let score = Self::similarity(query_embedding, &stored);

                Some(SearchHit {
                    record: Self::row_to_record(row),
                    score: Some(score),
                })
            })
            .collect();

        // sort_by is stable: equal scores keep their scan order.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit.max(1));

        Ok(scored)
    }
}

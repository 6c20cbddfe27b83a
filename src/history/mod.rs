//! Per-user conversation history.
//!
//! [`ConversationStore`] is the adapter contract over whatever persistence
//! backs chat histories. The SQLite implementation keeps one turn row per
//! message and one summary row per user; compaction swaps the accumulated
//! turns for a summary inside a single transaction. All operations are
//! last-write-wins and safe to retry.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use crate::core::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }

    fn from_db(value: &str) -> Role {
        match value {
            "bot" => Role::Bot,
            _ => Role::User,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    pub turns: Vec<ChatTurn>,
    pub summary: Option<String>,
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Appends one turn with a server-assigned timestamp.
    async fn append(&self, user_id: &str, role: Role, message: &str) -> Result<(), ApiError>;

    async fn read(&self, user_id: &str) -> Result<ChatHistory, ApiError>;

    /// Atomically replaces the user's accumulated turns with a summary.
    async fn compact(&self, user_id: &str, summary: &str) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct SqliteHistoryStore {
    pool: SqlitePool,
}

impl SqliteHistoryStore {
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
            .map_err(|e| ApiError::internal(format!("Failed to connect to history db: {e}")))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chat_turns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init chat_turns table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chat_turns_user ON chat_turns(user_id)")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chat_summaries (
                user_id TEXT PRIMARY KEY,
                summary TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init chat_summaries table: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl ConversationStore for SqliteHistoryStore {
    async fn append(&self, user_id: &str, role: Role, message: &str) -> Result<(), ApiError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO chat_turns (user_id, role, message, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(role.as_str())
        .bind(message)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    async fn read(&self, user_id: &str) -> Result<ChatHistory, ApiError> {
        let rows = sqlx::query(
            "SELECT role, message, created_at FROM chat_turns WHERE user_id = ? ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let turns = rows
            .iter()
            .map(|row| {
                let role: String = row.get("role");
                let created_at: String = row.get("created_at");
                ChatTurn {
                    role: Role::from_db(&role),
                    message: row.get("message"),
                    timestamp: DateTime::parse_from_rfc3339(&created_at)
                        .map(|t| t.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                }
            })
            .collect();

        let summary: Option<String> =
            sqlx::query_scalar("SELECT summary FROM chat_summaries WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(ApiError::internal)?;

        Ok(ChatHistory { turns, summary })
    }

    async fn compact(&self, user_id: &str, summary: &str) -> Result<(), ApiError> {
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        sqlx::query(
            "INSERT INTO chat_summaries (user_id, summary, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET summary = excluded.summary,
                 updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(summary)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query("DELETE FROM chat_turns WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        tx.commit().await.map_err(ApiError::internal)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> (SqliteHistoryStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteHistoryStore::new(dir.path().join("history.db"))
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn append_and_read_preserves_order() {
        let (store, _dir) = test_store().await;

        store.append("u1", Role::User, "first").await.unwrap();
        store.append("u1", Role::Bot, "second").await.unwrap();
        store.append("u2", Role::User, "other user").await.unwrap();

        let history = store.read("u1").await.unwrap();
        assert_eq!(history.turns.len(), 2);
        assert_eq!(history.turns[0].role, Role::User);
        assert_eq!(history.turns[0].message, "first");
        assert_eq!(history.turns[1].role, Role::Bot);
        assert!(history.summary.is_none());
    }

    #[tokio::test]
    async fn read_of_unknown_user_is_empty() {
        let (store, _dir) = test_store().await;
        let history = store.read("nobody").await.unwrap();
        assert!(history.turns.is_empty());
        assert!(history.summary.is_none());
    }

    #[tokio::test]
    async fn compact_replaces_turns_with_summary() {
        let (store, _dir) = test_store().await;

        for i in 0..4 {
            store
                .append("u1", Role::User, &format!("message {i}"))
                .await
                .unwrap();
        }

        store.compact("u1", "talked about math courses").await.unwrap();

        let history = store.read("u1").await.unwrap();
        assert!(history.turns.is_empty());
        assert_eq!(history.summary.as_deref(), Some("talked about math courses"));

        // New turns accumulate on top of the summary.
        store.append("u1", Role::User, "fresh question").await.unwrap();
        let history = store.read("u1").await.unwrap();
        assert_eq!(history.turns.len(), 1);
        assert!(history.summary.is_some());
    }

    #[tokio::test]
    async fn compact_is_idempotent() {
        let (store, _dir) = test_store().await;
        store.append("u1", Role::User, "hello").await.unwrap();

        store.compact("u1", "summary one").await.unwrap();
        store.compact("u1", "summary two").await.unwrap();

        let history = store.read("u1").await.unwrap();
        assert_eq!(history.summary.as_deref(), Some("summary two"));
    }
}

pub mod errors;
mod services;
pub mod types;

pub use errors::DatabaseError;
pub use types::{Chat, HistoryEntry, User, UserStats};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub struct DatabaseService {
    pool: SqlitePool,
}

impl DatabaseService {
    pub async fn new(database_url: &str) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?
            .create_if_missing(true)
            // sqlx enables `PRAGMA foreign_keys = ON` by default, overriding
            // SQLite's native OFF default that this schema and its tests were
            // written against (history rows tolerate missing chat references,
            // surfaced as untitled).
            .foreign_keys(false);
        // An in-memory SQLite database exists per connection; a larger pool
        // would hand each caller its own empty database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        let service = Self { pool };
        service.init_schema().await?;
        info!("Database schema ready");
        Ok(service)
    }

    async fn init_schema(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT,
    first_name TEXT,
    last_name TEXT,
    value INTEGER DEFAULT 0,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
CREATE TABLE IF NOT EXISTS chats (
    id INTEGER PRIMARY KEY,
    kind TEXT,
    title TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
CREATE TABLE IF NOT EXISTS change_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER,
    chat_id INTEGER,
    old_value INTEGER,
    new_value INTEGER,
    delta INTEGER,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users (id),
    FOREIGN KEY (chat_id) REFERENCES chats (id)
)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> DatabaseService {
        DatabaseService::new("sqlite::memory:")
            .await
            .expect("in-memory database")
    }

    #[tokio::test]
    async fn user_creation_is_idempotent() {
        let db = test_db().await;
        let created = db
            .get_or_create_user(12345, Some("test_user"), Some("Test"), Some("User"))
            .await
            .unwrap();
        assert_eq!(created.id, 12345);
        assert_eq!(created.value, 0);

        let again = db
            .get_or_create_user(12345, Some("test_user"), Some("Test"), Some("User"))
            .await
            .unwrap();
        assert_eq!(again.id, 12345);
        assert_eq!(db.top_users(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn profile_merge_keeps_existing_fields() {
        let db = test_db().await;
        db.get_or_create_user(1, Some("alice"), Some("Alice"), Some("A"))
            .await
            .unwrap();
        let merged = db.get_or_create_user(1, None, Some("Alicia"), None).await.unwrap();
        assert_eq!(merged.username.as_deref(), Some("alice"));
        assert_eq!(merged.first_name.as_deref(), Some("Alicia"));
        assert_eq!(merged.last_name.as_deref(), Some("A"));

        // The merge is persisted, not just returned.
        let reread = db.get_or_create_user(1, None, None, None).await.unwrap();
        assert_eq!(reread.first_name.as_deref(), Some("Alicia"));
    }

    #[tokio::test]
    async fn chat_creation_is_idempotent_and_never_updates() {
        let db = test_db().await;
        let chat = db.get_or_create_chat(67890, "group", Some("Test Chat")).await.unwrap();
        assert_eq!(chat.title.as_deref(), Some("Test Chat"));

        let same = db
            .get_or_create_chat(67890, "supergroup", Some("Renamed"))
            .await
            .unwrap();
        assert_eq!(same.kind, "group");
        assert_eq!(same.title.as_deref(), Some("Test Chat"));
    }

    #[tokio::test]
    async fn value_change_updates_user_and_appends_history() {
        let db = test_db().await;
        db.get_or_create_user(1, Some("alice"), None, None).await.unwrap();
        db.get_or_create_chat(10, "group", Some("Chat")).await.unwrap();
        db.apply_value_change(1, 7, 7, 10).await.unwrap();
        db.apply_value_change(1, 4, -3, 10).await.unwrap();

        let stats = db.user_stats(1).await.unwrap().unwrap();
        assert_eq!(stats.value, 4);
        assert_eq!(stats.total_changes, 2);
        assert!(stats.first_change.is_some());
        assert!(stats.last_change.is_some());

        let history = db.user_history(1, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].old_value, 7);
        assert_eq!(history[0].new_value, 4);
        assert_eq!(history[0].delta, -3);
        assert_eq!(history[0].chat_title.as_deref(), Some("Chat"));
        for entry in &history {
            assert_eq!(entry.new_value - entry.old_value, entry.delta);
        }
        for pair in history.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn value_change_for_unknown_user_is_rejected() {
        let db = test_db().await;
        let err = db.apply_value_change(999, 5, 5, 1).await.unwrap_err();
        assert!(matches!(err, DatabaseError::UserNotFound));
        assert!(db.user_history(999, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_reports_missing_chats_as_untitled() {
        let db = test_db().await;
        db.get_or_create_user(1, None, None, None).await.unwrap();
        db.apply_value_change(1, 2, 2, 555).await.unwrap();
        let history = db.user_history(1, 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].chat_title.is_none());
    }

    #[tokio::test]
    async fn rank_counts_strictly_greater_values() {
        let db = test_db().await;
        for (id, value) in [(1, 50), (2, 30), (3, 30), (4, 10)] {
            db.get_or_create_user(id, None, None, None).await.unwrap();
            db.apply_value_change(id, value, value, 1).await.unwrap();
        }
        assert_eq!(db.user_rank(1).await.unwrap(), Some(1));
        assert_eq!(db.user_rank(2).await.unwrap(), Some(2));
        assert_eq!(db.user_rank(3).await.unwrap(), Some(2));
        assert_eq!(db.user_rank(4).await.unwrap(), Some(4));
        assert_eq!(db.user_rank(999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn top_orders_by_value_descending() {
        let db = test_db().await;
        for (id, value) in [(1, 5), (2, 20), (3, -3)] {
            db.get_or_create_user(id, None, None, None).await.unwrap();
            db.apply_value_change(id, value, value, 1).await.unwrap();
        }
        let top = db.top_users(2).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, 2);
        assert_eq!(top[1].id, 1);
    }

    #[tokio::test]
    async fn last_change_timestamp_tracks_history() {
        let db = test_db().await;
        db.get_or_create_user(1, None, None, None).await.unwrap();
        assert!(db.last_change_timestamp(1).await.unwrap().is_none());
        db.apply_value_change(1, 2, 2, 1).await.unwrap();
        assert!(db.last_change_timestamp(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn stats_absent_for_unknown_user() {
        let db = test_db().await;
        assert!(db.user_stats(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reset_clears_users_and_history_but_keeps_chats() {
        let db = test_db().await;
        db.get_or_create_user(1, Some("alice"), None, None).await.unwrap();
        db.get_or_create_chat(10, "group", Some("Kept")).await.unwrap();
        db.apply_value_change(1, 3, 3, 10).await.unwrap();

        db.reset_all().await.unwrap();

        assert!(db.top_users(10).await.unwrap().is_empty());
        assert!(db.user_stats(1).await.unwrap().is_none());
        assert!(db.user_history(1, 10).await.unwrap().is_empty());
        let chat = db.get_or_create_chat(10, "group", None).await.unwrap();
        assert_eq!(chat.title.as_deref(), Some("Kept"));
    }
}

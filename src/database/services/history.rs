use super::super::errors::DatabaseError;
use super::super::types::{HistoryEntry, UserStats};
use super::super::DatabaseService;

impl DatabaseService {
    /// Most recent change timestamp across all chats, as stored.
    pub async fn last_change_timestamp(
        &self,
        user_id: i64,
    ) -> Result<Option<String>, DatabaseError> {
        let row: (Option<String>,) =
            sqlx::query_as("SELECT MAX(created_at) FROM change_history WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    pub async fn user_stats(&self, user_id: i64) -> Result<Option<UserStats>, DatabaseError> {
        let stats = sqlx::query_as::<_, UserStats>(
            "SELECT u.value AS value,
                    COUNT(h.id) AS total_changes,
                    MIN(h.created_at) AS first_change,
                    MAX(h.created_at) AS last_change
             FROM users u
             LEFT JOIN change_history h ON u.id = h.user_id
             WHERE u.id = ?
             GROUP BY u.id",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stats)
    }

    /// Last `limit` changes, newest first, annotated with chat titles.
    pub async fn user_history(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<HistoryEntry>, DatabaseError> {
        let entries = sqlx::query_as::<_, HistoryEntry>(
            "SELECT h.old_value, h.new_value, h.delta, h.created_at, c.title AS chat_title
             FROM change_history h
             LEFT JOIN chats c ON h.chat_id = c.id
             WHERE h.user_id = ?
             ORDER BY h.created_at DESC, h.id DESC
             LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}

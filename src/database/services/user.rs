use super::super::errors::DatabaseError;
use super::super::types::User;
use super::super::DatabaseService;

impl DatabaseService {
    /// Fetches the user, creating the row with value 0 on first interaction.
    /// Display fields merge last-write-wins: non-empty incoming values
    /// replace stored ones, absent values keep them. The returned `value` is
    /// the pre-update one.
    pub async fn get_or_create_user(
        &self,
        id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<User, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let user = match existing {
            Some(current) => {
                let username = merge_field(username, current.username.clone());
                let first_name = merge_field(first_name, current.first_name.clone());
                let last_name = merge_field(last_name, current.last_name.clone());
                sqlx::query(
                    "UPDATE users
                     SET username = ?, first_name = ?, last_name = ?, updated_at = CURRENT_TIMESTAMP
                     WHERE id = ?",
                )
                .bind(&username)
                .bind(&first_name)
                .bind(&last_name)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                User {
                    username,
                    first_name,
                    last_name,
                    ..current
                }
            }
            None => {
                sqlx::query(
                    "INSERT INTO users (id, username, first_name, last_name, value)
                     VALUES (?, ?, ?, ?, 0)",
                )
                .bind(id)
                .bind(username)
                .bind(first_name)
                .bind(last_name)
                .execute(&mut *tx)
                .await?;
                sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        tx.commit().await?;
        Ok(user)
    }

    /// Records one value change as a single atomic unit: reads the current
    /// value, updates the user row and appends the history entry in one
    /// transaction, so concurrent changes for the same user never interleave.
    pub async fn apply_value_change(
        &self,
        user_id: i64,
        new_value: i64,
        actual_delta: i64,
        chat_id: i64,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let old_value: Option<(i64,)> = sqlx::query_as("SELECT value FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some((old_value,)) = old_value else {
            return Err(DatabaseError::UserNotFound);
        };

        sqlx::query("UPDATE users SET value = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(new_value)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO change_history (user_id, chat_id, old_value, new_value, delta)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(chat_id)
        .bind(old_value)
        .bind(new_value)
        .bind(actual_delta)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Leaderboard query. Ties keep a stable order (oldest row first).
    pub async fn top_users(&self, limit: i64) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users
             ORDER BY value DESC, created_at ASC, id ASC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// 1 + number of users with a strictly greater value, so tied users
    /// share the same rank.
    pub async fn user_rank(&self, user_id: i64) -> Result<Option<i64>, DatabaseError> {
        let value: Option<(i64,)> = sqlx::query_as("SELECT value FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some((value,)) = value else {
            return Ok(None);
        };
        let (higher,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE value > ?")
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(Some(higher + 1))
    }

    /// Clears the leaderboard: all history rows, then all users, in one
    /// transaction. Chats keep their titles.
    pub async fn reset_all(&self) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM change_history").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM users").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

fn merge_field(incoming: Option<&str>, stored: Option<String>) -> Option<String> {
    match incoming {
        Some(s) if !s.is_empty() => Some(s.to_string()),
        _ => stored,
    }
}

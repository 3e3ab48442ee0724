use super::super::errors::DatabaseError;
use super::super::types::Chat;
use super::super::DatabaseService;

impl DatabaseService {
    /// Idempotent insert-or-fetch. Existing chats are never updated, so the
    /// stored title survives later renames.
    pub async fn get_or_create_chat(
        &self,
        id: i64,
        kind: &str,
        title: Option<&str>,
    ) -> Result<Chat, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let existing =
            sqlx::query_as::<_, Chat>("SELECT id, kind, title, created_at FROM chats WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let chat = match existing {
            Some(chat) => chat,
            None => {
                sqlx::query("INSERT INTO chats (id, kind, title) VALUES (?, ?, ?)")
                    .bind(id)
                    .bind(kind)
                    .bind(title)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query_as::<_, Chat>(
                    "SELECT id, kind, title, created_at FROM chats WHERE id = ?",
                )
                .bind(id)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(chat)
    }
}

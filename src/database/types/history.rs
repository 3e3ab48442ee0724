use sqlx::FromRow;

/// One row of a user's change history, annotated with the chat title the
/// change happened in (NULL when the chat is unknown or untitled).
#[derive(Debug, Clone, FromRow)]
pub struct HistoryEntry {
    pub old_value: i64,
    pub new_value: i64,
    pub delta: i64,
    pub created_at: String,
    pub chat_title: Option<String>,
}

/// Aggregate view over a user's history. Timestamp fields are absent when
/// the user has never changed their value.
#[derive(Debug, Clone, FromRow)]
pub struct UserStats {
    pub value: i64,
    pub total_changes: i64,
    pub first_change: Option<String>,
    pub last_change: Option<String>,
}

use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Chat {
    pub id: i64,
    pub kind: String,
    pub title: Option<String>,
    pub created_at: String,
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),
    #[error("User not found")]
    UserNotFound,
}

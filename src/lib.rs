pub mod commands;
pub mod communication;
pub mod configuration;
pub mod cooldown;
pub mod core;
pub mod database;
pub mod game;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config Error:{0}")]
    ConfigError(String),

    #[error("Database Error:{0}")]
    DatabaseError(String),

    #[error("Service error")]
    ServiceError,
}

use dotenvy::dotenv;
use sizebot::communication::telegram::TelegramService;
use sizebot::configuration::{Config, Context};
use sizebot::core::ServiceManager;
use sizebot::database::DatabaseService;
use sizebot::AppError;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv().ok();
    let config =
        Config::new("config.json").map_err(|e| AppError::ConfigError(e.to_string()))?;

    let log_level = Level::from_str(&config.log_level).unwrap_or(Level::INFO);
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(log_level.to_string()))
        .init();
    tracing::info!("Starting sizebot");

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:sizebot.db".to_string());
    let database = DatabaseService::new(&database_url)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;
    tracing::info!("Database connected: {}", database_url);

    let context = Context::new(config, Arc::new(database));
    let mut service_manager = ServiceManager::new(context);
    service_manager.spawn::<TelegramService>();

    service_manager
        .wait()
        .await
        .map_err(|_| AppError::ServiceError)
}

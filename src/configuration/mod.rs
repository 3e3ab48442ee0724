use crate::database::DatabaseService;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("File read error")]
    FileError,

    #[error("Deserialization error:{0}")]
    DeserializationError(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub game: GameConfig,
}

/// Game settings consumed by the value engine, the cooldown gate and the
/// command orchestrator. Built once at startup and passed in explicitly.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GameConfig {
    pub min_size: i64,
    pub max_size: i64,
    pub min_change: i64,
    pub max_change: i64,
    pub luck: i64,
    pub enforce_cooldown: bool,
    pub cooldown_seconds: i64,
    pub admin_ids: HashSet<i64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_size: -1_000_000,
            max_size: 1_000_000,
            min_change: -10,
            max_change: 10,
            luck: 0,
            enforce_cooldown: true,
            cooldown_seconds: 12 * 60 * 60,
            admin_ids: HashSet::new(),
        }
    }
}

impl GameConfig {
    /// Probability that a draw comes out positive. `luck` runs from -100
    /// (always negative) through 0 (fair coin) to 100 (always positive).
    pub fn positive_probability(&self) -> f64 {
        (0.5 + self.luck as f64 / 200.0).clamp(0.0, 1.0)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Clone)]
pub struct Context {
    pub config: Config,
    pub database: Arc<DatabaseService>,
}

impl Context {
    pub fn new(config: Config, database: Arc<DatabaseService>) -> Self {
        Self { config, database }
    }
}

impl Config {
    pub fn new(config_file: &str) -> Result<Self, ConfigError> {
        let config_str = fs::read_to_string(config_file).map_err(|_| ConfigError::FileError)?;
        let mut config: Config = serde_json::from_str(&config_str)
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))?;
        config.game.luck = config.game.luck.clamp(-100, 100);
        Ok(config)
    }
}

use crate::communication::telegram::Response;
use crate::configuration::GameConfig;
use crate::cooldown::{format_remaining, CooldownGate, CooldownState};
use crate::database::{DatabaseService, User};
use crate::game;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Database error: {0}")]
    Database(#[from] crate::database::DatabaseError),
}

/// Identity of the message sender as resolved by the transport.
#[derive(Debug, Clone)]
pub struct CommandUser {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl CommandUser {
    pub fn display_name(&self) -> String {
        self.first_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.username.as_deref().filter(|s| !s.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| format!("User {}", self.id))
    }
}

/// Originating chat as resolved by the transport.
#[derive(Debug, Clone)]
pub struct CommandChat {
    pub id: i64,
    pub kind: String,
    pub title: Option<String>,
}

pub struct CommandService {
    database: Arc<DatabaseService>,
    config: GameConfig,
    gate: CooldownGate,
}

impl CommandService {
    pub fn new(database: Arc<DatabaseService>, config: GameConfig) -> Self {
        let gate = CooldownGate::new(&config);
        Self {
            database,
            config,
            gate,
        }
    }

    async fn register(
        &self,
        user: &CommandUser,
        chat: &CommandChat,
    ) -> Result<User, CommandError> {
        let record = self
            .database
            .get_or_create_user(
                user.id,
                user.username.as_deref(),
                user.first_name.as_deref(),
                user.last_name.as_deref(),
            )
            .await?;
        self.database
            .get_or_create_chat(chat.id, &chat.kind, chat.title.as_deref())
            .await?;
        Ok(record)
    }

    pub async fn start(
        &self,
        user: &CommandUser,
        chat: &CommandChat,
    ) -> Result<Response, CommandError> {
        let record = self.register(user, chat).await?;
        let text = format!(
            "Hi, {}!\nCurrent size: {} ({})\nCommands: /grow /stats /top /history /help",
            record.display_name(),
            record.value,
            game::describe_value(record.value),
        );
        Ok(Response { text })
    }

    /// The game action: cooldown gate, random draw, clamped apply, atomic
    /// persist, rank lookup.
    pub async fn change(
        &self,
        user: &CommandUser,
        chat: &CommandChat,
    ) -> Result<Response, CommandError> {
        let record = self.register(user, chat).await?;

        let last_change = self.database.last_change_timestamp(user.id).await?;
        if let CooldownState::Waiting { remaining_seconds } =
            self.gate.check(last_change.as_deref(), Utc::now())
        {
            let text = format!(
                "Too soon. Try again in {} (cooldown {} h)",
                format_remaining(remaining_seconds),
                self.gate.cooldown_seconds() / 3600,
            );
            return Ok(Response { text });
        }

        let delta = game::compute_delta(&self.config);
        let (new_value, actual_delta) = game::apply_delta(&self.config, record.value, delta);
        self.database
            .apply_value_change(user.id, new_value, actual_delta, chat.id)
            .await?;

        let rank_line = match self.database.user_rank(user.id).await? {
            Some(rank) => format!("Your place on the leaderboard: {}", rank),
            None => "Not on the leaderboard yet".to_string(),
        };
        let verb = if actual_delta > 0 { "grew" } else { "shrank" };
        let unit = if actual_delta.abs() == 1 { "point" } else { "points" };
        let text = format!(
            "{}, your size {} by {} {}\nCurrent value: {}\n{}",
            record.display_name(),
            verb,
            actual_delta.abs(),
            unit,
            new_value,
            rank_line,
        );
        Ok(Response { text })
    }

    pub async fn stats(&self, user: &CommandUser) -> Result<Response, CommandError> {
        let Some(stats) = self.database.user_stats(user.id).await? else {
            return Ok(Response {
                text: "No stats found. Try /grow first!".to_string(),
            });
        };

        let text = format!(
            "📊 Stats for {}:\n\n\
             📏 Current size: {} ({}) {}\n\n\
             📈 Total changes: {}\n\
             📅 First change: {}\n\
             🕐 Last change: {}\n\n\
             Use /history to see recent changes",
            user.display_name(),
            stats.value,
            game::describe_value(stats.value),
            game::emoji_for_value(stats.value),
            stats.total_changes,
            stats.first_change.as_deref().unwrap_or("No data"),
            stats.last_change.as_deref().unwrap_or("No data"),
        );
        Ok(Response { text })
    }

    pub async fn top(&self) -> Result<Response, CommandError> {
        let top = self.database.top_users(10).await?;
        if top.is_empty() {
            return Ok(Response {
                text: "No leaderboard data yet. Try /grow!".to_string(),
            });
        }

        let mut text = String::from("🏆 Top 10 by size:\n\n");
        for (i, user) in top.iter().enumerate() {
            let medal = match i + 1 {
                1 => "🥇".to_string(),
                2 => "🥈".to_string(),
                3 => "🥉".to_string(),
                place => format!("{}.", place),
            };
            text.push_str(&format!(
                "{} {}: {} ({}) {}\n",
                medal,
                user.display_name(),
                user.value,
                game::describe_value(user.value),
                game::emoji_for_value(user.value),
            ));
        }
        Ok(Response { text })
    }

    pub async fn history(&self, user: &CommandUser) -> Result<Response, CommandError> {
        let entries = self.database.user_history(user.id, 5).await?;
        if entries.is_empty() {
            return Ok(Response {
                text: "No change history yet. Try /grow first!".to_string(),
            });
        }

        let mut text = format!("📜 Change history for {}:\n\n", user.display_name());
        for (i, entry) in entries.iter().enumerate() {
            text.push_str(&format!(
                "{}. {}\n   Was: {} → Now: {}\n   Chat: {}\n   Date: {}\n\n",
                i + 1,
                game::describe_delta(entry.delta),
                entry.old_value,
                entry.new_value,
                entry.chat_title.as_deref().unwrap_or("Unknown chat"),
                entry.created_at,
            ));
        }
        Ok(Response { text })
    }

    pub fn help(&self) -> Response {
        Response {
            text: format!(
                "Quick reference:\n\
                 /grow — change your size ({}…+{})\n\
                 /stats — your current size\n\
                 /top — leaderboard\n\
                 /history — recent changes\n\
                 /help — this message",
                self.config.min_change, self.config.max_change,
            ),
        }
    }

    /// Admin-only full reset. The allow-list check guards against accidental
    /// misuse, not adversarial access.
    pub async fn reset_all(&self, user: &CommandUser) -> Response {
        if !self.config.admin_ids.contains(&user.id) {
            return Response {
                text: "⛔ You are not allowed to use this command".to_string(),
            };
        }
        match self.database.reset_all().await {
            Ok(()) => {
                info!("All stats reset by admin {}", user.id);
                Response {
                    text: "✅ All stats have been reset".to_string(),
                }
            }
            Err(e) => {
                error!("Failed to reset stats: {}", e);
                Response {
                    text: "⚠️ Could not reset stats. Check the logs".to_string(),
                }
            }
        }
    }

    pub fn unknown(&self) -> Response {
        Response {
            text: "❓ Unknown command. Use /help to see available commands".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseService;

    fn test_config() -> GameConfig {
        GameConfig {
            enforce_cooldown: false,
            admin_ids: [99].into_iter().collect(),
            ..GameConfig::default()
        }
    }

    async fn service(config: GameConfig) -> CommandService {
        let db = DatabaseService::new("sqlite::memory:")
            .await
            .expect("in-memory database");
        CommandService::new(Arc::new(db), config)
    }

    fn user(id: i64) -> CommandUser {
        CommandUser {
            id,
            username: Some("tester".to_string()),
            first_name: Some("Tester".to_string()),
            last_name: None,
        }
    }

    fn chat() -> CommandChat {
        CommandChat {
            id: 500,
            kind: "group".to_string(),
            title: Some("Game Room".to_string()),
        }
    }

    #[tokio::test]
    async fn start_reports_the_initial_value() {
        let service = service(test_config()).await;
        let response = service.start(&user(1), &chat()).await.unwrap();
        assert!(response.text.contains("Hi, Tester!"));
        assert!(response.text.contains("Current size: 0 (average)"));
    }

    #[tokio::test]
    async fn change_moves_the_value_and_reports_rank() {
        let service = service(test_config()).await;
        let response = service.change(&user(1), &chat()).await.unwrap();
        assert!(response.text.contains("Tester, your size"));
        assert!(response.text.contains("Your place on the leaderboard: 1"));

        let stats = service.database.user_stats(1).await.unwrap().unwrap();
        assert_eq!(stats.total_changes, 1);
        assert_ne!(stats.value, 0);
        assert!(stats.value >= service.config.min_change && stats.value <= service.config.max_change);
    }

    #[tokio::test]
    async fn cooldown_blocks_an_immediate_second_change() {
        let config = GameConfig {
            enforce_cooldown: true,
            ..test_config()
        };
        let service = service(config).await;
        service.change(&user(1), &chat()).await.unwrap();

        let blocked = service.change(&user(1), &chat()).await.unwrap();
        assert!(blocked.text.contains("Too soon"));
        assert!(blocked.text.contains("cooldown 12 h"));

        let stats = service.database.user_stats(1).await.unwrap().unwrap();
        assert_eq!(stats.total_changes, 1);
    }

    #[tokio::test]
    async fn stats_prompts_new_users_to_play() {
        let service = service(test_config()).await;
        let response = service.stats(&user(7)).await.unwrap();
        assert!(response.text.contains("/grow"));
    }

    #[tokio::test]
    async fn top_lists_users_by_value() {
        let service = service(test_config()).await;
        for (id, value) in [(1, 40), (2, 15)] {
            let name = format!("user{}", id);
            service
                .database
                .get_or_create_user(id, Some(&name), None, None)
                .await
                .unwrap();
            service
                .database
                .apply_value_change(id, value, value, 500)
                .await
                .unwrap();
        }
        let response = service.top().await.unwrap();
        assert!(response.text.contains("🥇 user1: 40"));
        assert!(response.text.contains("🥈 user2: 15"));
    }

    #[tokio::test]
    async fn top_nudges_when_empty() {
        let service = service(test_config()).await;
        let response = service.top().await.unwrap();
        assert!(response.text.contains("No leaderboard data yet"));
    }

    #[tokio::test]
    async fn history_lists_recent_changes() {
        let service = service(test_config()).await;
        service.change(&user(1), &chat()).await.unwrap();
        let response = service.history(&user(1)).await.unwrap();
        assert!(response.text.contains("Game Room"));
        assert!(response.text.contains("Was: 0"));
    }

    #[tokio::test]
    async fn reset_requires_admin() {
        let service = service(test_config()).await;
        service.change(&user(1), &chat()).await.unwrap();

        let denied = service.reset_all(&user(1)).await;
        assert!(denied.text.contains("not allowed"));
        assert!(service.database.user_stats(1).await.unwrap().is_some());

        let allowed = service.reset_all(&user(99)).await;
        assert!(allowed.text.contains("reset"));
        assert!(service.database.user_stats(1).await.unwrap().is_none());
        assert!(service.database.top_users(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn help_mentions_every_command() {
        let service = service(test_config()).await;
        let text = service.help().text;
        for command in ["/grow", "/stats", "/top", "/history", "/help"] {
            assert!(text.contains(command));
        }
        assert!(text.contains("-10…+10"));
    }
}

use crate::commands::{CommandChat, CommandService, CommandUser};
use crate::communication::error_handler;
use crate::configuration::Context;
use crate::core::service_manager::{Error as ServiceManagerError, Service};
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, Chat};
use tracing::{error, warn};

pub struct TelegramService {
    bot: Bot,
    commands: CommandService,
}

pub struct Response {
    pub text: String,
}

#[async_trait]
impl Service for TelegramService {
    type Context = Context;

    async fn new(context: Context) -> Self {
        let commands =
            CommandService::new(context.database.clone(), context.config.game.clone());
        let bot = Bot::from_env();

        Self { bot, commands }
    }

    async fn run(self) -> Result<(), ServiceManagerError> {
        if let Err(e) = self.bot.set_my_commands(Self::bot_commands()).await {
            warn!("Could not register bot commands: {}", e);
        }
        let commands = Arc::new(self.commands);
        teloxide::repl(self.bot, move |bot: Bot, msg: Message| {
            let commands = Arc::clone(&commands);
            async move {
                tokio::spawn(Self::handle_message(bot, msg, commands));
                respond(())
            }
        })
        .await;
        Ok(())
    }
}

impl TelegramService {
    // reset_all stays out of the menu on purpose.
    fn bot_commands() -> Vec<BotCommand> {
        vec![
            BotCommand::new("start", "Start the bot"),
            BotCommand::new("grow", "Change your size"),
            BotCommand::new("stats", "Show your stats"),
            BotCommand::new("top", "Leaderboard"),
            BotCommand::new("history", "Recent changes"),
            BotCommand::new("help", "Quick reference"),
        ]
    }

    async fn handle_message(
        bot: Bot,
        msg: Message,
        commands: Arc<CommandService>,
    ) -> ResponseResult<()> {
        let Some(text) = msg.text() else {
            return Ok(());
        };
        let Some(command) = command_token(text) else {
            return Ok(());
        };
        let Some(from) = msg.from() else {
            return Ok(());
        };

        let user = CommandUser {
            id: from.id.0 as i64,
            username: from.username.clone(),
            first_name: Some(from.first_name.clone()).filter(|s| !s.is_empty()),
            last_name: from.last_name.clone(),
        };
        let chat = CommandChat {
            id: msg.chat.id.0,
            kind: chat_kind(&msg.chat).to_string(),
            title: msg.chat.title().map(str::to_string),
        };

        let response = match command {
            "start" => commands.start(&user, &chat).await,
            "grow" => commands.change(&user, &chat).await,
            "stats" => commands.stats(&user).await,
            "top" => commands.top().await,
            "history" => commands.history(&user).await,
            "help" => Ok(commands.help()),
            "reset_all" => Ok(commands.reset_all(&user).await),
            _ => Ok(commands.unknown()),
        };
        let response = response.unwrap_or_else(|e| {
            error!("Command /{} failed for user {}: {}", command, user.id, e);
            error_handler::create_error_response(&e)
        });

        bot.send_message(msg.chat.id, response.text).await?;
        Ok(())
    }
}

/// First token of the message, without the leading slash and without the
/// @BotName suffix used when addressing the bot in groups. Non-commands
/// yield None.
fn command_token(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    let command = first.strip_prefix('/')?;
    command.split('@').next()
}

fn chat_kind(chat: &Chat) -> &'static str {
    if chat.is_private() {
        "private"
    } else if chat.is_group() {
        "group"
    } else if chat.is_supergroup() {
        "supergroup"
    } else {
        "channel"
    }
}

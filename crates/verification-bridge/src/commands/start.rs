//! Start command - links the sender's username to their chat.

use crate::commands::help::HELP_TEXT;
use crate::commands::CommandHandler;
use crate::directory::HandleDirectory;
use crate::error::BridgeResult;
use async_trait::async_trait;
use std::sync::Arc;
use telegram_client::BotMessage;
use tracing::info;

pub const NO_USERNAME_TEXT: &str = "Hello! Please set a username in your Telegram profile, \
otherwise the system cannot identify you.";

pub struct StartHandler {
    directory: Arc<HandleDirectory>,
}

impl StartHandler {
    pub fn new(directory: Arc<HandleDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl CommandHandler for StartHandler {
    fn trigger(&self) -> &str {
        "/start"
    }

    async fn execute(&self, message: &BotMessage) -> BridgeResult<String> {
        let Some(username) = message.username.as_deref() else {
            info!(chat_id = message.chat_id, "Start without username");
            return Ok(NO_USERNAME_TEXT.into());
        };

        self.directory.register(username, message.chat_id).await;

        Ok(format!("Hello, {}! {}", message.first_name, HELP_TEXT))
    }
}

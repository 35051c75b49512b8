//! Help command - says what the bot is for.

use crate::commands::CommandHandler;
use crate::error::BridgeResult;
use async_trait::async_trait;
use telegram_client::BotMessage;

pub const HELP_TEXT: &str =
    "I send verification codes. You will receive a code here during registration.";

pub struct HelpHandler;

impl HelpHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HelpHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandHandler for HelpHandler {
    fn trigger(&self) -> &str {
        "/help"
    }

    async fn execute(&self, _message: &BotMessage) -> BridgeResult<String> {
        Ok(HELP_TEXT.into())
    }
}

//! Bot command handlers.

mod help;
mod start;

pub use help::HelpHandler;
pub use start::StartHandler;

use crate::error::BridgeResult;
use async_trait::async_trait;
use telegram_client::BotMessage;

/// Command handler trait.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command trigger (e.g., "/start").
    fn trigger(&self) -> &str;

    /// Check if this handler matches the message.
    fn matches(&self, message: &BotMessage) -> bool {
        message.command() == Some(self.trigger())
    }

    /// Execute the command and return the reply text.
    async fn execute(&self, message: &BotMessage) -> BridgeResult<String>;
}

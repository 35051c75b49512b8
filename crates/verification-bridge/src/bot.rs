//! Telegram bot loop.

use crate::commands::CommandHandler;
use std::future::Future;
use std::time::Duration;
use telegram_client::{BotMessage, TelegramClient, UpdateReceiver};
use tokio_stream::StreamExt;
use tracing::{error, info};

/// Routes incoming messages to command handlers and sends their replies.
pub struct Bot {
    client: TelegramClient,
    handlers: Vec<Box<dyn CommandHandler>>,
}

impl Bot {
    pub fn new(client: TelegramClient, handlers: Vec<Box<dyn CommandHandler>>) -> Self {
        Self { client, handlers }
    }

    /// Run the first matching handler. Messages no handler claims get no reply.
    pub async fn handle(&self, message: &BotMessage) -> Option<String> {
        let handler = self.handlers.iter().find(|h| h.matches(message))?;

        match handler.execute(message).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                error!("Handler {} error: {}", handler.trigger(), e);
                Some("Sorry, something went wrong.".into())
            }
        }
    }

    /// Poll for messages until `shutdown` resolves.
    pub async fn run(self, poll_timeout: Duration, shutdown: impl Future<Output = ()>) {
        info!("Registered {} command handlers", self.handlers.len());

        let receiver = UpdateReceiver::new(self.client.clone(), poll_timeout);
        let mut stream = Box::pin(receiver.stream());
        tokio::pin!(shutdown);

        info!("Listening for Telegram messages...");
        loop {
            tokio::select! {
                Some(message) = stream.next() => {
                    if let Some(reply) = self.handle(&message).await {
                        if let Err(e) = self.client.reply(&message, &reply).await {
                            error!("Failed to send reply: {}", e);
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("Bot stopping");
                    break;
                }
            }
        }
    }
}

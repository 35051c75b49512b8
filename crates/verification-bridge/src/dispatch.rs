//! Outbound message delivery.

use crate::directory::DeliveryAddress;
use async_trait::async_trait;
use std::time::Duration;
use telegram_client::{TelegramClient, TelegramError};
use thiserror::Error;

/// Failure delivering a message.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Telegram(#[from] TelegramError),

    #[error("{0}")]
    Other(String),
}

/// Sends a text message to a delivery address.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send(&self, address: DeliveryAddress, text: &str) -> Result<(), DispatchError>;
}

#[async_trait]
impl Dispatcher for TelegramClient {
    async fn send(&self, address: DeliveryAddress, text: &str) -> Result<(), DispatchError> {
        self.send_message(address, text).await?;
        Ok(())
    }
}

/// Body of the message carrying a verification code.
pub fn code_message(code: &str, ttl: Duration) -> String {
    let minutes = ttl.as_secs().div_ceil(60).max(1);
    let unit = if minutes == 1 { "minute" } else { "minutes" };
    format!(
        "Your verification code: {}\n\nThis code is valid for {} {}.",
        code, minutes, unit
    )
}

/// Body of the message sent once registration completes.
pub fn registration_message(full_name: &str, login: &str) -> String {
    format!(
        "Congratulations, {}! You have registered successfully.\n\nLogin: {}",
        full_name, login
    )
}

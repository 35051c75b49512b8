//! Telegram Bot API types.

use serde::{Deserialize, Serialize};

/// Envelope wrapping every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

/// Incoming update from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub date: i64,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Long polling request.
#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: Vec<String>,
}

/// Outgoing message request.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
}

/// Parsed message for bot processing.
#[derive(Debug, Clone)]
pub struct BotMessage {
    /// Update that carried this message.
    pub update_id: i64,
    /// Chat the message arrived in; replies go here.
    pub chat_id: i64,
    /// Sender's public username, if they have set one.
    pub username: Option<String>,
    /// Sender's first name.
    pub first_name: String,
    /// The message text.
    pub text: String,
}

impl BotMessage {
    /// Extract a bot message from an update.
    ///
    /// Returns `None` for updates without a text message.
    pub fn from_update(update: &Update) -> Option<Self> {
        let message = update.message.as_ref()?;
        let text = message.text.clone()?;
        let (username, first_name) = match &message.from {
            Some(user) => (user.username.clone(), user.first_name.clone()),
            None => (None, String::new()),
        };

        Some(Self {
            update_id: update.update_id,
            chat_id: message.chat.id,
            username,
            first_name,
            text,
        })
    }

    /// Leading bot command without the `@botname` suffix, e.g. `/start`.
    pub fn command(&self) -> Option<&str> {
        let first = self.text.split_whitespace().next()?;
        if !first.starts_with('/') {
            return None;
        }
        Some(first.split('@').next().unwrap_or(first))
    }
}

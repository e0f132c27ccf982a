pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::TelegramClient;

/// One inbound event from `getUpdates`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Update {
    #[serde(rename = "update_id")]
    pub id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default, rename = "callback_query")]
    pub callback: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[allow(dead_code)]
pub struct Message {
    #[serde(rename = "message_id")]
    pub id: i64,
    /// Absent for channel posts.
    #[serde(default, rename = "from")]
    pub sender: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: String,
}

/// Inline button press. `data` carries the selected host id.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[allow(dead_code)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(rename = "from")]
    pub sender: User,
    #[serde(default, rename = "message")]
    pub origin_message: Option<Message>,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[allow(dead_code)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[allow(dead_code)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Inline keyboard as sent in `reply_markup`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyboardMarkup {
    #[serde(rename = "inline_keyboard")]
    pub rows: Vec<Vec<KeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyboardButton {
    #[serde(rename = "text")]
    pub label: String,
    pub callback_data: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{method} request failed: {source}")]
    Http {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} returned HTTP {status}: {body}")]
    Status {
        method: &'static str,
        status: u16,
        body: String,
    },
    #[error("{method} rejected by Telegram: {description}")]
    Api {
        method: &'static str,
        description: String,
    },
    #[error("{method} response could not be decoded: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// The four Bot API calls the bot core needs.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Long-poll for updates with id >= `offset`, blocking up to `timeout_secs`.
    async fn fetch_updates(
        &self,
        offset: i64,
        timeout_secs: u32,
    ) -> Result<Vec<Update>, TransportError>;

    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        markup: Option<&KeyboardMarkup>,
    ) -> Result<(), TransportError>;

    async fn answer_callback(&self, callback_id: &str) -> Result<(), TransportError>;
}

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::telegram::{KeyboardMarkup, Transport};

/// Telegram rejects messages longer than this.
const MAX_MESSAGE_LEN: usize = 4096;

/// Split text into chunks of at most `max_len` bytes, preferring line breaks.
fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let cut = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(&text[start..cut]);
        start = cut;
    }

    chunks
}

/// Sends bot output to the configured chat.
#[derive(Clone)]
pub struct Responder {
    transport: Arc<dyn Transport>,
    chat_id: String,
}

impl Responder {
    pub fn new(transport: Arc<dyn Transport>, chat_id: &str) -> Self {
        Self {
            transport,
            chat_id: chat_id.to_string(),
        }
    }

    /// Send an HTML message, split into several when it is too long.
    /// The first failure is returned to the caller.
    pub async fn send_text(&self, text: &str) -> Result<()> {
        let chunks = split_message(text, MAX_MESSAGE_LEN);
        for chunk in &chunks {
            self.transport
                .send_message(&self.chat_id, chunk, None)
                .await
                .context("Failed to send message")?;
        }
        debug!(
            "Sent message ({} chars in {} part(s))",
            text.chars().count(),
            chunks.len()
        );
        Ok(())
    }

    /// Send a message with an inline keyboard. Failures are only logged.
    pub async fn send_keyboard(&self, text: &str, markup: &KeyboardMarkup) {
        if let Err(e) = self
            .transport
            .send_message(&self.chat_id, text, Some(markup))
            .await
        {
            warn!("Failed to send keyboard: {}", e);
        }
    }

    /// Acknowledge a button press so the client stops its spinner. Failures are only logged.
    pub async fn answer_callback(&self, callback_id: &str) {
        if let Err(e) = self.transport.answer_callback(callback_id).await {
            warn!("Failed to answer callback {}: {}", callback_id, e);
        }
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::bot::callback::handle_callback;
use crate::bot::commands::handle_command;
use crate::bot::BotContext;
use crate::telegram::{CallbackQuery, Message, Update};

/// What an update asks the bot to do.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingUpdate {
    Command(Message),
    Callback(CallbackQuery),
    Unsupported,
}

impl From<Update> for IncomingUpdate {
    fn from(update: Update) -> Self {
        match (update.message, update.callback) {
            (Some(msg), _) if !msg.text.is_empty() => IncomingUpdate::Command(msg),
            (_, Some(query)) => IncomingUpdate::Callback(query),
            _ => IncomingUpdate::Unsupported,
        }
    }
}

/// Consumer of polled updates.
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn handle(&self, update: Update);
}

/// Routes updates to the command router or the callback handler.
pub struct Dispatcher {
    ctx: Arc<BotContext>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl UpdateHandler for Dispatcher {
    async fn handle(&self, update: Update) {
        let update_id = update.id;
        let result = match IncomingUpdate::from(update) {
            IncomingUpdate::Command(msg) => handle_command(&self.ctx, &msg).await,
            IncomingUpdate::Callback(query) => handle_callback(&self.ctx, &query).await,
            IncomingUpdate::Unsupported => {
                debug!("Skipping unsupported update {}", update_id);
                Ok(())
            }
        };

        if let Err(e) = result {
            error!("Failed to handle update {}: {:#}", update_id, e);
        }
    }
}

pub mod action_bot;
pub mod commands;
pub mod handlers;

use std::sync::Arc;
use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;

use crate::ai::llm::LlmClient;
use crate::config::AppConfig;
use crate::db::Database;
use action_bot::ActionBot;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shared application state, accessible from all handlers.
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub bot: ActionBot,
    pub llm: LlmClient,
}

/// Build the teloxide update handler tree.
pub fn build_handler() -> UpdateHandler<HandlerError> {
    let command_handler = Update::filter_message()
        .filter_command::<commands::BotCommand>()
        .endpoint(commands::handle_command);

    let message_handler = Update::filter_message()
        .endpoint(handlers::handle_message);

    dptree::entry()
        .branch(command_handler)
        .branch(message_handler)
}

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing_subscriber::EnvFilter;

mod ai;
mod bot;
mod chat_action;
mod config;
mod db;
mod tarot;

use bot::action_bot::ActionBot;
use bot::commands::BotCommand;
use config::AppConfig;
use db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("🔮 Starting tarot bot...");

    // Load config
    let config = AppConfig::from_env()?;
    tracing::info!("Config loaded. Model: {}", config.openai_model);

    // Initialize database
    let db = Database::connect(&config.database_url).await?;
    db.run_migrations().await?;
    tracing::info!("Database connected and migrations applied.");

    // Create the Telegram bot
    let bot = Bot::new(&config.telegram_bot_token);
    bot.set_my_commands(BotCommand::bot_commands()).await?;

    // Build shared application state
    let state = Arc::new(bot::AppState {
        llm: ai::llm::LlmClient::new(&config),
        bot: ActionBot::new(bot.clone(), config.chat_action_interval),
        config,
        db,
    });

    // Build the dispatcher
    let handler = bot::build_handler();

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state.clone()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("Dispatcher stopped, shutting down...");
    state.bot.close_all().await;
    state.db.close().await;

    Ok(())
}

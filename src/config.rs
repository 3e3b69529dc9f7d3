use std::time::Duration;

use serde::Deserialize;

use crate::chat_action::DEFAULT_ANNOUNCE_INTERVAL;

/// Largest spread a user can ask for.
pub const MAX_CARD_COUNT: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub database_url: String,

    pub openai_api_key: String,
    pub openai_model: String,
    /// Base URL of an OpenAI-compatible API, without the trailing slash
    pub openai_base_url: String,

    /// Cards drawn when the user has not picked a spread size
    pub default_card_count: usize,

    /// How often a pending chat action is re-sent
    pub chat_action_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN")?,
            database_url: std::env::var("DATABASE_URL")?,
            openai_api_key: std::env::var("OPENAI_API_KEY")?,
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            default_card_count: std::env::var("DEFAULT_CARD_COUNT")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(5)
                .clamp(1, MAX_CARD_COUNT),
            chat_action_interval: std::env::var("CHAT_ACTION_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_ANNOUNCE_INTERVAL),
        })
    }
}

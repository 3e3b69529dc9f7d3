use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::bot::action_bot::SendOptions;
use crate::bot::handlers::send_block_message;
use crate::bot::{AppState, HandlerError};
use crate::config::MAX_CARD_COUNT;
use crate::db::models::UserState;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum BotCommand {
    #[command(description = "Start / restart the bot")]
    Start,
    #[command(description = "Show help")]
    Help,
    #[command(description = "Set the number of cards in a spread, e.g. /cards 3")]
    Cards(String),
}

pub async fn handle_command(
    msg: Message,
    cmd: BotCommand,
    state: Arc<AppState>,
) -> Result<(), HandlerError> {
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);
    let username = msg
        .from
        .as_ref()
        .and_then(|u| u.username.as_deref());
    let chat_id = msg.chat.id;

    let user = state.db.get_or_create_user(user_id, username).await?;
    if !user.access {
        send_block_message(&state, chat_id).await?;
        return Ok(());
    }

    match cmd {
        BotCommand::Start => {
            state.db.update_state(user_id, UserState::Main).await?;
            state
                .bot
                .send_message(
                    chat_id,
                    format!(
                        "🔮 Welcome! I read tarot cards.\n\n\
                         Write your question and I'll lay out a spread of {} cards for it.\n\
                         Use /cards to change the size of the spread.\n\
                         Use /help for all commands.",
                        state.config.default_card_count
                    ),
                    SendOptions::default(),
                )
                .await?;
        }

        BotCommand::Help => {
            state
                .bot
                .send_message(
                    chat_id,
                    BotCommand::descriptions().to_string(),
                    SendOptions::default(),
                )
                .await?;
        }

        BotCommand::Cards(arg) => {
            let text = match parse_card_count(&arg) {
                Some(count) => {
                    state.db.update_state(user_id, UserState::Cards(count)).await?;
                    tracing::info!("User {} switched to a {}-card spread", user_id, count);
                    format!("🃏 Your next spreads will have {} cards.", count)
                }
                None => format!(
                    "Please give a number from 1 to {}, e.g. /cards 3",
                    MAX_CARD_COUNT
                ),
            };
            state
                .bot
                .send_message(chat_id, text, SendOptions::default().reply_to(msg.id))
                .await?;
        }
    }

    Ok(())
}

fn parse_card_count(arg: &str) -> Option<usize> {
    arg.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=MAX_CARD_COUNT).contains(n))
}

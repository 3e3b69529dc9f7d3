use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ChatAction;

use crate::ai::llm::reading_prompt;
use crate::bot::action_bot::SendOptions;
use crate::bot::{AppState, HandlerError};
use crate::tarot::{self, DrawnCard};

/// Telegram rejects longer text messages.
const MAX_MESSAGE_CHARS: usize = 4096;

/// Answers any text message with a tarot reading for it.
pub async fn handle_message(msg: Message, state: Arc<AppState>) -> Result<(), HandlerError> {
    let Some(question) = msg.text() else {
        // Unsupported message type
        return Ok(());
    };
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);
    let username = msg.from.as_ref().and_then(|u| u.username.as_deref());
    let chat_id = msg.chat.id;

    let user = state.db.get_or_create_user(user_id, username).await?;
    if !user.access {
        send_block_message(&state, chat_id).await?;
        return Ok(());
    }
    tracing::info!("Reading requested by user {}: {}", user_id, question);

    // ── 1. Draw the spread ─────────────────────────────────────────

    let count = user.user_state().card_count(state.config.default_card_count);
    let cards = {
        let mut rng = rand::rng();
        tarot::draw(&mut rng, count)
    };

    // ── 2. Keep "typing…" up until the reading is sent ─────────────

    state
        .bot
        .send_chat_action(chat_id, ChatAction::Typing, Some(msg.id))
        .await?;

    let finish = SendOptions::default()
        .reply_to(msg.id)
        .finishes(ChatAction::Typing, msg.id);

    if let Err(e) = state
        .bot
        .send_message(chat_id, spread_text(&cards), SendOptions::default().reply_to(msg.id))
        .await
    {
        tracing::warn!("Failed to send spread to chat {}: {:#}", chat_id, e);
    }

    // ── 3. Ask the model for the reading ───────────────────────────

    let reply = match read_cards(&state, user_id, &cards, question).await {
        Ok(reading) => truncate_chars(&reading, MAX_MESSAGE_CHARS),
        Err(e) => {
            tracing::error!("Reading failed for user {}: {:#}", user_id, e);
            "😔 The cards are silent right now, please try again later.".to_string()
        }
    };

    // ── 4. Deliver it, which also ends the chat action ─────────────

    state.bot.send_message(chat_id, reply, finish).await?;

    Ok(())
}

async fn read_cards(
    state: &AppState,
    user_id: i64,
    cards: &[DrawnCard],
    question: &str,
) -> anyhow::Result<String> {
    let response = state.llm.chat(&reading_prompt(cards, question)).await?;
    if let Some(usage) = &response.usage {
        tracing::debug!(
            "Reading for user {} used {} prompt + {} completion tokens",
            user_id,
            usage.prompt_tokens,
            usage.completion_tokens
        );
    }

    let names: Vec<String> = cards.iter().map(ToString::to_string).collect();
    if let Err(e) = state
        .db
        .save_reading(user_id, &names, question, &response.text)
        .await
    {
        tracing::warn!("Failed to save reading for user {}: {:#}", user_id, e);
    }

    Ok(response.text)
}

pub async fn send_block_message(state: &AppState, chat_id: ChatId) -> anyhow::Result<()> {
    state
        .bot
        .send_message(
            chat_id,
            "<b>😨 You don't have access, please contact the administrators</b>",
            SendOptions::default().html(),
        )
        .await?;
    Ok(())
}

fn spread_text(cards: &[DrawnCard]) -> String {
    let mut text = String::from("🃏 Your spread:\n");
    for (i, card) in cards.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, card));
    }
    text
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_text_numbers_cards() {
        let cards = [
            DrawnCard {
                name: "The Sun",
                reversed: false,
            },
            DrawnCard {
                name: "Death",
                reversed: true,
            },
        ];
        assert_eq!(
            spread_text(&cards),
            "🃏 Your spread:\n1. The Sun\n2. Death (reversed)\n"
        );
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate_chars("карты", 3), "кар");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("", 0), "");
    }
}

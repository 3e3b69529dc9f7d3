use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{ChatAction, MessageId, ParseMode, ReplyParameters};

use crate::chat_action::{ActionItem, ChatActionScheduler};

/// Extra knobs for an outgoing message.
#[derive(Debug, Clone, Copy, Default)]
pub struct SendOptions {
    reply_to: Option<MessageId>,
    parse_mode: Option<ParseMode>,
    tracked: Option<ActionItem>,
}

impl SendOptions {
    pub fn reply_to(mut self, message_id: MessageId) -> Self {
        self.reply_to = Some(message_id);
        self
    }

    pub fn html(mut self) -> Self {
        self.parse_mode = Some(ParseMode::Html);
        self
    }

    /// The chat action this message finishes, see [`ActionBot::send_chat_action`].
    pub fn finishes(mut self, action: ChatAction, marker: MessageId) -> Self {
        self.tracked = Some(ActionItem { action, marker });
        self
    }
}

/// Telegram client whose chat actions outlive a single `sendChatAction` call.
///
/// A chat action requested with a marker is re-sent until a message sent with
/// the same `(action, marker)` pair goes out, whether that send succeeds or not.
#[derive(Clone)]
pub struct ActionBot {
    bot: Bot,
    actions: ChatActionScheduler,
}

impl ActionBot {
    pub fn new(bot: Bot, announce_interval: Duration) -> Self {
        let actions = ChatActionScheduler::new(Arc::new(bot.clone()), announce_interval);
        Self { bot, actions }
    }

    pub async fn send_chat_action(
        &self,
        chat_id: ChatId,
        action: ChatAction,
        marker: Option<MessageId>,
    ) -> anyhow::Result<()> {
        self.actions.request_action(chat_id, action, marker).await
    }

    pub async fn send_message(
        &self,
        chat_id: ChatId,
        text: impl Into<String>,
        options: SendOptions,
    ) -> anyhow::Result<Message> {
        let mut request = self.bot.send_message(chat_id, text);
        if let Some(message_id) = options.reply_to {
            request = request.reply_parameters(ReplyParameters::new(message_id));
        }
        if let Some(parse_mode) = options.parse_mode {
            request = request.parse_mode(parse_mode);
        }

        let result = request.await;
        tracing::debug!(chat_id = %chat_id, tracked = ?options.tracked, ok = result.is_ok(), "Message sent");

        // Sending a message hides the indicator on the client side, so the
        // announcer is restarted even for untracked messages.
        self.actions.discard_action(
            chat_id,
            options.tracked.map(|item| item.action),
            options.tracked.map(|item| item.marker),
        );

        Ok(result?)
    }

    /// Stop every chat action announcer. Called once on shutdown.
    pub async fn close_all(&self) {
        self.actions.close_all().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT: ChatId = ChatId(42);

    /// A bot whose API calls fail fast with a connection error.
    fn offline_bot() -> ActionBot {
        let url = reqwest::Url::parse("http://127.0.0.1:9/").unwrap();
        ActionBot::new(Bot::new("1:offline").set_api_url(url), Duration::from_secs(5))
    }

    #[test]
    fn send_options_builder() {
        let options = SendOptions::default()
            .reply_to(MessageId(3))
            .html()
            .finishes(ChatAction::Typing, MessageId(3));

        assert_eq!(options.reply_to, Some(MessageId(3)));
        assert_eq!(options.parse_mode, Some(ParseMode::Html));
        assert_eq!(
            options.tracked,
            Some(ActionItem {
                action: ChatAction::Typing,
                marker: MessageId(3)
            })
        );
    }

    #[tokio::test]
    async fn failed_send_still_discards_its_action() {
        let bot = offline_bot();
        bot.send_chat_action(CHAT, ChatAction::Typing, Some(MessageId(1)))
            .await
            .unwrap();
        assert_eq!(bot.actions.tracked_chats(), 1);

        let result = bot
            .send_message(
                CHAT,
                "reading",
                SendOptions::default().finishes(ChatAction::Typing, MessageId(1)),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(bot.actions.tracked_chats(), 0);
    }

    #[tokio::test]
    async fn untracked_send_keeps_pending_action() {
        let bot = offline_bot();
        bot.send_chat_action(CHAT, ChatAction::Typing, Some(MessageId(1)))
            .await
            .unwrap();

        let _ = bot
            .send_message(CHAT, "shuffling", SendOptions::default())
            .await;

        assert_eq!(
            bot.actions.pending(CHAT),
            vec![ActionItem {
                action: ChatAction::Typing,
                marker: MessageId(1)
            }]
        );
        bot.close_all().await;
        assert_eq!(bot.actions.tracked_chats(), 0);
    }
}

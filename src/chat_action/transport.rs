use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ChatAction;

/// Emits a single network-level presence signal for a chat.
#[async_trait]
pub trait PresenceTransport: Send + Sync {
    async fn send_presence(&self, chat_id: ChatId, action: ChatAction) -> anyhow::Result<()>;
}

#[async_trait]
impl PresenceTransport for Bot {
    async fn send_presence(&self, chat_id: ChatId, action: ChatAction) -> anyhow::Result<()> {
        self.send_chat_action(chat_id, action).await?;
        Ok(())
    }
}

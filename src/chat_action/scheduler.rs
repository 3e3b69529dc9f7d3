use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use teloxide::types::{ChatAction, ChatId, MessageId};
use tokio::task::JoinHandle;

use super::transport::PresenceTransport;

/// Telegram hides a chat action after about five seconds, so it is re-sent at this cadence.
pub const DEFAULT_ANNOUNCE_INTERVAL: Duration = Duration::from_secs(5);

/// "Keep `action` visible until the send tied to `marker` completes."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionItem {
    pub action: ChatAction,
    pub marker: MessageId,
}

/// Pending actions of one chat and the task announcing the newest of them.
///
/// A chat without an entry in the registry is idle. Once an item is queued the
/// entry exists together with a running announcer; every later mutation
/// either replaces that announcer or, when the queue drains, removes the entry.
struct ConversationState {
    items: Vec<ActionItem>,
    announcer: Option<JoinHandle<()>>,
}

impl ConversationState {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            announcer: None,
        }
    }

    fn current(&self) -> Option<ChatAction> {
        self.items.last().map(|item| item.action)
    }

    /// Appends `item`, or moves it to the tail if it is already queued.
    fn push(&mut self, item: ActionItem) {
        if let Some(pos) = self.items.iter().position(|queued| *queued == item) {
            self.items.remove(pos);
        }
        self.items.push(item);
    }

    /// Removes one occurrence of `item`. Returns false if it was not queued.
    fn remove(&mut self, item: &ActionItem) -> bool {
        match self.items.iter().position(|queued| queued == item) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }

    fn is_announcing(&self) -> bool {
        self.announcer
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn cancel_announcer(&mut self) -> Option<JoinHandle<()>> {
        let handle = self.announcer.take();
        if let Some(handle) = &handle {
            handle.abort();
        }
        handle
    }
}

struct Inner {
    transport: Arc<dyn PresenceTransport>,
    interval: Duration,
    registry: Mutex<HashMap<ChatId, ConversationState>>,
}

impl Inner {
    fn current_action(&self, chat_id: ChatId) -> Option<ChatAction> {
        self.registry
            .lock()
            .get(&chat_id)
            .and_then(ConversationState::current)
    }
}

/// Keeps a chat action alive per chat while tracked sends are in flight.
///
/// Every queue mutation and the announcer replacement that follows it happen
/// under one registry lock, which is never held across an `.await`.
#[derive(Clone)]
pub struct ChatActionScheduler {
    inner: Arc<Inner>,
}

impl ChatActionScheduler {
    pub fn new(transport: Arc<dyn PresenceTransport>, interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                interval,
                registry: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Request a chat action for `chat_id`.
    ///
    /// Without a marker this is a plain one-shot `sendChatAction` and its
    /// result is returned as is. With a marker the action is queued and kept
    /// alive until [`discard_action`](Self::discard_action) is called with the
    /// same pair; the newest request is the one shown.
    pub async fn request_action(
        &self,
        chat_id: ChatId,
        action: ChatAction,
        marker: Option<MessageId>,
    ) -> anyhow::Result<()> {
        match marker {
            Some(marker) => {
                self.track(chat_id, ActionItem { action, marker });
                Ok(())
            }
            None => {
                tracing::debug!(chat_id = %chat_id, ?action, "Sending one-shot chat action");
                self.inner.transport.send_presence(chat_id, action).await
            }
        }
    }

    fn track(&self, chat_id: ChatId, item: ActionItem) {
        let mut registry = self.inner.registry.lock();
        let state = registry.entry(chat_id).or_insert_with(ConversationState::new);
        state.push(item);
        tracing::debug!(chat_id = %chat_id, ?item, queued = state.items.len(), "Chat action queued");

        if !state.is_announcing() {
            state.announcer = Some(self.spawn_announcer(chat_id));
        }
    }

    /// Drop the action tied to a finished send.
    ///
    /// With both `action` and `marker` the matching item is removed (a missing
    /// item is only logged). Without them nothing is removed, the announcer is
    /// just restarted. Either way the announcer is replaced so it re-reads the
    /// current tail, or stopped together with the entry once the queue is
    /// empty.
    pub fn discard_action(
        &self,
        chat_id: ChatId,
        action: Option<ChatAction>,
        marker: Option<MessageId>,
    ) {
        let mut registry = self.inner.registry.lock();
        let Some(state) = registry.get_mut(&chat_id) else {
            return;
        };

        if let (Some(action), Some(marker)) = (action, marker) {
            let item = ActionItem { action, marker };
            if !state.remove(&item) {
                tracing::warn!(chat_id = %chat_id, ?item, "Chat action to discard was not queued");
            }
        }

        self.restart_or_remove(&mut registry, chat_id);
    }

    /// Replaces the chat's announcer, or removes the entry once its queue is empty.
    fn restart_or_remove(
        &self,
        registry: &mut HashMap<ChatId, ConversationState>,
        chat_id: ChatId,
    ) {
        let Some(state) = registry.get_mut(&chat_id) else {
            return;
        };
        state.cancel_announcer();

        if state.items.is_empty() {
            registry.remove(&chat_id);
            tracing::debug!(chat_id = %chat_id, "No chat actions left, announcer stopped");
        } else {
            state.announcer = Some(self.spawn_announcer(chat_id));
        }
    }

    fn spawn_announcer(&self, chat_id: ChatId) -> JoinHandle<()> {
        tokio::spawn(announce(Arc::downgrade(&self.inner), chat_id))
    }

    /// Cancel every announcer, wait for them to finish and forget all chats.
    pub async fn close_all(&self) {
        let announcers: Vec<JoinHandle<()>> = {
            let mut registry = self.inner.registry.lock();
            registry
                .drain()
                .filter_map(|(_, mut state)| state.cancel_announcer())
                .collect()
        };

        let count = announcers.len();
        for handle in announcers {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::warn!("Chat action announcer ended abnormally: {}", e);
                }
            }
        }

        tracing::info!("Closed {} chat action announcers", count);
    }
}

/// Re-sends the chat's current action every interval until its queue is gone.
/// Cancellation through `JoinHandle::abort` is the usual way out.
async fn announce(inner: Weak<Inner>, chat_id: ChatId) {
    loop {
        let Some(scheduler) = inner.upgrade() else {
            return;
        };
        let Some(action) = scheduler.current_action(chat_id) else {
            tracing::debug!(chat_id = %chat_id, "Announcer finished, queue is empty");
            return;
        };

        if let Err(e) = scheduler.transport.send_presence(chat_id, action).await {
            tracing::warn!(chat_id = %chat_id, ?action, "Failed to send chat action: {:#}", e);
        }
        tracing::debug!(chat_id = %chat_id, ?action, "Chat action sent");

        let interval = scheduler.interval;
        drop(scheduler);
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
impl ChatActionScheduler {
    pub(crate) fn pending(&self, chat_id: ChatId) -> Vec<ActionItem> {
        self.inner
            .registry
            .lock()
            .get(&chat_id)
            .map(|state| state.items.clone())
            .unwrap_or_default()
    }

    pub(crate) fn tracked_chats(&self) -> usize {
        self.inner.registry.lock().len()
    }
}

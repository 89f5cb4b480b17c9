use std::collections::HashSet;

use teloxide::types::ChatId;

use crate::database::UserStore;

/// In-memory view of who gets scheduled updates and who owes us a city.
///
/// `subscribed` mirrors the user store. It must only be changed after the
/// corresponding store mutation went through.
#[derive(Debug, Default)]
pub struct SubscriptionState {
    subscribed: HashSet<ChatId>,
    awaiting_city: HashSet<ChatId>,
}

impl SubscriptionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn initialize(&mut self, store: &dyn UserStore) {
        match store.get_users().await {
            Ok(users) => {
                self.subscribed = users.iter().map(|u| u.chat_id()).collect();
                log::info!("Loaded {} subscribers", self.subscribed.len());
            }
            Err(e) => {
                log::error!("Database error, starting without subscribers: {e}");
                self.subscribed.clear();
            }
        }
    }

    /// Returns `false` without touching anything if the chat is already awaiting.
    pub fn mark_awaiting(&mut self, chat_id: ChatId) -> bool {
        self.awaiting_city.insert(chat_id)
    }

    #[cfg(test)]
    pub fn is_awaiting(&self, chat_id: ChatId) -> bool {
        self.awaiting_city.contains(&chat_id)
    }

    pub fn clear_awaiting(&mut self, chat_id: ChatId) -> bool {
        self.awaiting_city.remove(&chat_id)
    }

    pub fn add_subscriber(&mut self, chat_id: ChatId) {
        self.subscribed.insert(chat_id);
    }

    pub fn remove_subscriber(&mut self, chat_id: ChatId) {
        self.subscribed.remove(&chat_id);
    }

    #[cfg(test)]
    pub fn is_subscribed(&self, chat_id: ChatId) -> bool {
        self.subscribed.contains(&chat_id)
    }

    pub fn subscribers(&self) -> Vec<ChatId> {
        self.subscribed.iter().copied().collect()
    }
}

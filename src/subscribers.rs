use serde::{Deserialize, Serialize};

/// One notification recipient. Serialized field names match the original
/// `subscribers.json` layout so an existing registry file keeps loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub chat_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    pub subscribed_at: String,
}

/// Registry of subscribers keyed by chat id. Insertion order is preserved
/// for listing and for the on-disk representation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubscriberRegistry {
    subscribers: Vec<Subscriber>,
}

impl SubscriberRegistry {
    /// Adds a subscriber. Returns false without modifying the registry when
    /// the chat id is already present.
    pub fn insert(&mut self, subscriber: Subscriber) -> bool {
        if self.contains(subscriber.chat_id) {
            return false;
        }
        self.subscribers.push(subscriber);
        true
    }

    /// Removes a subscriber by chat id. Returns false when it was absent.
    pub fn remove(&mut self, chat_id: i64) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.chat_id != chat_id);
        self.subscribers.len() != before
    }

    pub fn contains(&self, chat_id: i64) -> bool {
        self.get(chat_id).is_some()
    }

    pub fn get(&self, chat_id: i64) -> Option<&Subscriber> {
        self.subscribers.iter().find(|s| s.chat_id == chat_id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn subscribers(&self) -> &[Subscriber] {
        &self.subscribers
    }

    pub fn snapshot(&self) -> Vec<Subscriber> {
        self.subscribers.clone()
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::store::{KeyValueStore, StorageError, StorageEvent};

struct SharedSlots {
    slots: RwLock<HashMap<String, String>>,
    sender: broadcast::Sender<StorageEvent>,
}

/// Process-local storage. Handles created with [`InMemoryKeyValueStore::attach_peer`]
/// share slots and notifications but write under their own origin, the way
/// two browser tabs share one origin's storage.
#[derive(Clone)]
pub struct InMemoryKeyValueStore {
    shared: Arc<SharedSlots>,
    origin: Uuid,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);

        Self {
            shared: Arc::new(SharedSlots {
                slots: RwLock::new(HashMap::new()),
                sender,
            }),
            origin: Uuid::new_v4(),
        }
    }

    pub fn attach_peer(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            origin: Uuid::new_v4(),
        }
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self.shared.slots.read().await;
        Ok(slots.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        {
            let mut slots = self.shared.slots.write().await;
            slots.insert(key.to_string(), value.to_string());
        }

        let event = StorageEvent {
            key: key.to_string(),
            new_value: Some(value.to_string()),
            origin: self.origin,
        };

        // No subscribers is fine
        if self.shared.sender.send(event).is_err() {
            debug!("No storage subscribers for slot {}", key);
        }

        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.shared.sender.subscribe()
    }

    fn origin(&self) -> Uuid {
        self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_slot_returns_none() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_peers_share_slots_and_notifications() {
        let first = InMemoryKeyValueStore::new();
        let second = first.attach_peer();
        let mut events = second.subscribe();

        first.set("slot", "{\"a\":1}").await.unwrap();

        assert_eq!(second.get("slot").await.unwrap().as_deref(), Some("{\"a\":1}"));

        let event = events.recv().await.unwrap();
        assert_eq!(event.key, "slot");
        assert_eq!(event.origin, first.origin());
        assert_ne!(event.origin, second.origin());
    }
}

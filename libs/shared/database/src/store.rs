use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

/// A write to a named slot, as seen by every connected instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
    /// Instance that performed the write.
    pub origin: Uuid,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Named-slot storage shared between instances.
///
/// Every successful `set` is announced to subscribers of every handle
/// attached to the same backing storage, including the writer itself;
/// receivers compare `origin` against their own to skip echoes.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;

    fn origin(&self) -> Uuid;
}

use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use futures::StreamExt;
use redis::AsyncCommands;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::store::{KeyValueStore, StorageError, StorageEvent};

pub const STORAGE_EVENTS_CHANNEL: &str = "storage:events";

/// Redis-backed slots. Writes are announced on a pub/sub channel so every
/// instance attached to the same Redis sees them.
pub struct RedisKeyValueStore {
    pool: Pool,
    sender: broadcast::Sender<StorageEvent>,
    origin: Uuid,
}

impl RedisKeyValueStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StorageError> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StorageError::Pool(format!("Pool creation error: {}", e)))?;

        // Test connection
        let mut conn = pool
            .get()
            .await
            .map_err(|e| StorageError::Pool(format!("Connection error: {}", e)))?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        let (sender, _) = broadcast::channel(256);
        let client = redis::Client::open(redis_url)?;
        tokio::spawn(forward_notifications(client, sender.clone()));

        info!("Redis key-value store initialized successfully");

        Ok(Self {
            pool,
            sender,
            origin: Uuid::new_v4(),
        })
    }

    async fn get_connection(&self) -> Result<Connection, StorageError> {
        self.pool
            .get()
            .await
            .map_err(|e| StorageError::Pool(format!("Connection error: {}", e)))
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self.get_connection().await?;
        let _: () = conn.set(key, value).await?;

        let event = StorageEvent {
            key: key.to_string(),
            new_value: Some(value.to_string()),
            origin: self.origin,
        };
        let payload = serde_json::to_string(&event)?;
        let _: () = conn.publish(STORAGE_EVENTS_CHANNEL, payload).await?;

        debug!("Slot {} written ({} bytes)", key, value.len());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.sender.subscribe()
    }

    fn origin(&self) -> Uuid {
        self.origin
    }
}

async fn forward_notifications(client: redis::Client, sender: broadcast::Sender<StorageEvent>) {
    let conn = match client.get_async_connection().await {
        Ok(conn) => conn,
        Err(e) => {
            error!("Failed to open Redis pub/sub connection: {}", e);
            return;
        }
    };

    let mut pubsub = conn.into_pubsub();
    if let Err(e) = pubsub.subscribe(STORAGE_EVENTS_CHANNEL).await {
        error!("Failed to subscribe to {}: {}", STORAGE_EVENTS_CHANNEL, e);
        return;
    }

    let mut messages = pubsub.on_message();
    while let Some(msg) = messages.next().await {
        let payload: String = match msg.get_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Unreadable storage notification: {}", e);
                continue;
            }
        };

        match serde_json::from_str::<StorageEvent>(&payload) {
            Ok(event) => {
                let _ = sender.send(event);
            }
            Err(e) => warn!("Malformed storage notification: {}", e),
        }
    }

    warn!("Redis storage notification stream ended");
}

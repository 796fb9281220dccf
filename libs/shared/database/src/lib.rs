pub mod memory;
pub mod redis_store;
pub mod store;

use std::sync::Arc;

use tracing::info;

use shared_config::AppConfig;

pub use memory::InMemoryKeyValueStore;
pub use redis_store::RedisKeyValueStore;
pub use store::{KeyValueStore, StorageError, StorageEvent};

/// Picks the Redis backend when `REDIS_URL` is configured, otherwise a
/// process-local store.
pub async fn connect_store(config: &AppConfig) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    match &config.redis_url {
        Some(url) => {
            let store = RedisKeyValueStore::connect(url).await?;
            Ok(Arc::new(store))
        }
        None => {
            info!("Using in-memory key-value store");
            Ok(Arc::new(InMemoryKeyValueStore::new()))
        }
    }
}

use redis::AsyncCommands;
use redis::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use std::marker::PhantomData;

use crate::db::RecordStore;
use crate::error::AppError;
use crate::error::AppResult;

const KEY_PREFIX: &str = "swipetune";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Seeds,
    Exclusions,
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKey::Seeds => write!(f, "{}:seeds", KEY_PREFIX),
            StoreKey::Exclusions => write!(f, "{}:exclusions", KEY_PREFIX),
        }
    }
}

/// Creates a Redis client for the record stores
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Record store kept in a Redis list, one JSON document per element
pub struct RedisStore<T> {
    redis_client: Client,
    key: StoreKey,
    _record: PhantomData<fn() -> T>,
}

impl<T> RedisStore<T> {
    pub fn new(redis_client: Client, key: StoreKey) -> Self {
        Self {
            redis_client,
            key,
            _record: PhantomData,
        }
    }
}

#[async_trait::async_trait]
impl<T> RecordStore<T> for RedisStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn append(&self, record: &T) -> AppResult<()> {
        let json = serde_json::to_string(record)
            .map_err(|e| AppError::Internal(format!("Store serialization error: {}", e)))?;

        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.rpush(format!("{}", self.key), json).await?;
        Ok(())
    }

    async fn all(&self) -> AppResult<Vec<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let raw: Vec<String> = conn.lrange(format!("{}", self.key), 0, -1).await?;

        raw.iter()
            .map(|json| {
                serde_json::from_str(json).map_err(|e| {
                    AppError::Internal(format!("Store deserialization error: {}", e))
                })
            })
            .collect()
    }

    async fn clear(&self) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(format!("{}", self.key)).await?;

        tracing::info!(key = %self.key, "Store cleared");
        Ok(())
    }
}

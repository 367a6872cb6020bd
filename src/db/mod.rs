pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::create_redis_client;
pub use redis::RedisStore;
pub use redis::StoreKey;

/// Append-only record storage with an administrative clear
///
/// Backs both the seed set and the exclusion list. Records come back from
/// [`RecordStore::all`] in insertion order. Implementations make no
/// durability or transactional promises, and concurrent clears are not
/// coordinated with appends.
#[async_trait::async_trait]
pub trait RecordStore<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Appends one record
    async fn append(&self, record: &T) -> crate::error::AppResult<()>;

    /// Reads every stored record, oldest first
    async fn all(&self) -> crate::error::AppResult<Vec<T>>;

    /// Removes every stored record
    async fn clear(&self) -> crate::error::AppResult<()>;
}

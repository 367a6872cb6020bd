use tokio::sync::RwLock;

use crate::db::RecordStore;
use crate::error::AppResult;

/// In-process store, used in tests and when no Redis URL is configured
pub struct MemoryStore<T> {
    records: RwLock<Vec<T>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<T> RecordStore<T> for MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn append(&self, record: &T) -> AppResult<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn all(&self) -> AppResult<Vec<T>> {
        Ok(self.records.read().await.clone())
    }

    async fn clear(&self) -> AppResult<()> {
        self.records.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_all_preserves_insertion_order() {
        let store = MemoryStore::new();
        store.append(&"first".to_string()).await.unwrap();
        store.append(&"second".to_string()).await.unwrap();
        store.append(&"first".to_string()).await.unwrap();

        let all = store.all().await.unwrap();
        assert_eq!(all, vec!["first", "second", "first"]);
    }

    #[tokio::test]
    async fn test_clear_empties_store() {
        let store = MemoryStore::new();
        store.append(&1u32).await.unwrap();
        store.clear().await.unwrap();

        assert!(store.all().await.unwrap().is_empty());
    }
}

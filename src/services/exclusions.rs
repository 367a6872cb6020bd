use std::sync::Arc;

use crate::{db::RecordStore, error::AppResult, models::Recommendation};

/// History of every recommendation returned, fed back into prompts
#[derive(Clone)]
pub struct ExclusionTracker {
    store: Arc<dyn RecordStore<Recommendation>>,
}

impl ExclusionTracker {
    pub fn new(store: Arc<dyn RecordStore<Recommendation>>) -> Self {
        Self { store }
    }

    pub async fn record(&self, recommendation: &Recommendation) -> AppResult<()> {
        self.store.append(recommendation).await
    }

    pub async fn all_excluded(&self) -> AppResult<Vec<Recommendation>> {
        self.store.all().await
    }

    pub async fn clear(&self) -> AppResult<()> {
        self.store.clear().await
    }
}

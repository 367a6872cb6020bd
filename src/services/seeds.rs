use std::sync::Arc;

use crate::{
    db::RecordStore,
    error::AppResult,
    models::{AudioFeatures, SeedPayload, SeedRecord, TrackId},
};

/// Persists seed tracks and projects them into prompt payloads
///
/// Seeds without features are still stored; they contribute a name and
/// artists to the profile with every feature field null. No deduplication
/// is performed.
#[derive(Clone)]
pub struct SeedAggregator {
    store: Arc<dyn RecordStore<SeedRecord>>,
}

impl SeedAggregator {
    pub fn new(store: Arc<dyn RecordStore<SeedRecord>>) -> Self {
        Self { store }
    }

    pub async fn persist(
        &self,
        spotify_id: TrackId,
        name: String,
        artists: Vec<String>,
        features: Option<AudioFeatures>,
    ) -> AppResult<()> {
        let record = SeedRecord {
            spotify_id,
            name,
            artists,
            features,
        };

        self.store.append(&record).await
    }

    /// Every stored seed in insertion order, re-read on each call
    pub async fn project(&self) -> AppResult<Vec<SeedPayload>> {
        let records = self.store.all().await?;
        Ok(records.into_iter().map(SeedPayload::from).collect())
    }

    pub async fn clear(&self) -> AppResult<()> {
        self.store.clear().await
    }
}

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use crate::{
    models::{AudioFeatures, EnrichedTrack, TrackId},
    services::{normalizer, providers::FeatureProvider},
};

/// Maximum ids the feature service accepts per lookup
pub const FEATURE_BATCH_SIZE: usize = 40;

/// Maps track identifiers to audio features in bounded batches
///
/// The output of [`FeatureEnricher::enrich`] always has one entry per input,
/// in input order, carrying the caller's raw identifier. Failures never
/// shorten it:
/// - identifiers that cannot be normalized never reach the feature service
/// - a failed lookup leaves every id of that batch without features
/// - a failed detail call leaves only that id without features
///
/// Duplicates are removed within each batch. An id that already got features
/// from an earlier batch is not requested again; one whose earlier batch
/// failed is retried wherever it appears next. Every answer is written to all
/// positions holding that id, so duplicates always agree.
#[derive(Clone)]
pub struct FeatureEnricher {
    provider: Arc<dyn FeatureProvider>,
    batch_size: usize,
}

impl FeatureEnricher {
    pub fn new(provider: Arc<dyn FeatureProvider>) -> Self {
        Self::with_batch_size(provider, FEATURE_BATCH_SIZE)
    }

    fn with_batch_size(provider: Arc<dyn FeatureProvider>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
        }
    }

    pub async fn enrich<S: AsRef<str>>(&self, ids: &[S]) -> Vec<EnrichedTrack> {
        let start = Instant::now();

        let mut output: Vec<EnrichedTrack> = ids
            .iter()
            .map(|raw| EnrichedTrack {
                id: raw.as_ref().to_string(),
                features: None,
            })
            .collect();

        let canonical: Vec<Option<TrackId>> = ids
            .iter()
            .map(|raw| normalizer::normalize(raw.as_ref()))
            .collect();

        let mut positions: HashMap<TrackId, Vec<usize>> = HashMap::new();
        for (position, id) in canonical.iter().enumerate() {
            if let Some(id) = id {
                positions.entry(id.clone()).or_default().push(position);
            }
        }

        let unresolvable = canonical.iter().filter(|id| id.is_none()).count();
        if unresolvable > 0 {
            tracing::debug!(count = unresolvable, "Skipping unresolvable track ids");
        }

        let mut enriched_ids: HashSet<TrackId> = HashSet::new();
        let mut failed_batches = 0;

        for (batch_index, batch) in canonical.chunks(self.batch_size).enumerate() {
            let mut seen: HashSet<&TrackId> = HashSet::new();
            let batch_ids: Vec<TrackId> = batch
                .iter()
                .flatten()
                .filter(|id| !enriched_ids.contains(*id) && seen.insert(*id))
                .cloned()
                .collect();

            if batch_ids.is_empty() {
                continue;
            }

            let Some(resolved) = self.enrich_batch(batch_index, &batch_ids).await else {
                failed_batches += 1;
                continue;
            };

            for (id, features) in resolved {
                for &position in positions.get(&id).into_iter().flatten() {
                    output[position].features = Some(features.clone());
                }
                enriched_ids.insert(id);
            }
        }

        let enriched = output.iter().filter(|t| t.features.is_some()).count();
        tracing::info!(
            total = ids.len(),
            unique = positions.len(),
            enriched = enriched,
            failed_batches = failed_batches,
            processing_time_ms = start.elapsed().as_millis(),
            "Feature enrichment completed"
        );

        output
    }

    /// Looks up one batch and fetches features for each confirmed id
    ///
    /// Returns `None` when the lookup itself fails.
    async fn enrich_batch(
        &self,
        batch_index: usize,
        ids: &[TrackId],
    ) -> Option<Vec<(TrackId, AudioFeatures)>> {
        let items = match self.provider.lookup_tracks(ids).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    batch = batch_index,
                    batch_len = ids.len(),
                    "Feature lookup failed, skipping batch"
                );
                return None;
            }
        };

        let wanted: HashSet<&TrackId> = ids.iter().collect();
        let mut fetched: HashSet<TrackId> = HashSet::new();
        let mut resolved = Vec::with_capacity(items.len());

        for item in items {
            if !wanted.contains(&item.track_id) {
                tracing::debug!(track_id = %item.track_id, "Ignoring unrequested lookup item");
                continue;
            }
            if !fetched.insert(item.track_id.clone()) {
                continue;
            }

            match self.provider.audio_features(&item.internal_id).await {
                Ok(features) => resolved.push((item.track_id, features)),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        track_id = %item.track_id,
                        internal_id = %item.internal_id,
                        "Audio features unavailable"
                    );
                }
            }
        }

        tracing::debug!(
            batch = batch_index,
            requested = ids.len(),
            resolved = resolved.len(),
            "Feature batch processed"
        );

        Some(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};
    use crate::models::FeatureLookupItem;
    use crate::services::providers::MockFeatureProvider;
    use std::sync::Mutex;

    const KNOWN: &str = "4nRhbx8L4ifnMKaE5jSQGR";

    fn features_for(id: &str) -> AudioFeatures {
        AudioFeatures {
            tempo: 90.0 + id.as_bytes()[0] as f64,
            danceability: 0.5,
            energy: 0.6,
            valence: 0.4,
            acousticness: 0.1,
            instrumentalness: 0.0,
            liveness: 0.2,
            loudness: -6.0,
            speechiness: 0.05,
            key: 5,
            mode: 1,
            time_signature: 4,
        }
    }

    /// Scripted feature service: knows a fixed id set, can fail chosen calls
    #[derive(Default)]
    struct FakeFeatures {
        known: HashSet<String>,
        failing_lookups: HashSet<usize>,
        failing_details: HashSet<String>,
        lookup_calls: Mutex<Vec<Vec<String>>>,
        detail_calls: Mutex<Vec<String>>,
    }

    impl FakeFeatures {
        fn knowing<I: IntoIterator<Item = String>>(ids: I) -> Self {
            Self {
                known: ids.into_iter().collect(),
                ..Default::default()
            }
        }

        fn lookup_calls(&self) -> Vec<Vec<String>> {
            self.lookup_calls.lock().unwrap().clone()
        }

        fn detail_calls(&self) -> Vec<String> {
            self.detail_calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl FeatureProvider for FakeFeatures {
        async fn lookup_tracks(&self, ids: &[TrackId]) -> AppResult<Vec<FeatureLookupItem>> {
            let call = {
                let mut calls = self.lookup_calls.lock().unwrap();
                calls.push(ids.iter().map(|id| id.to_string()).collect());
                calls.len() - 1
            };

            if self.failing_lookups.contains(&call) {
                return Err(AppError::ExternalApi("lookup unavailable".to_string()));
            }

            Ok(ids
                .iter()
                .filter(|id| self.known.contains(id.as_str()))
                .map(|id| FeatureLookupItem {
                    internal_id: format!("rb-{}", id),
                    track_id: id.clone(),
                })
                .collect())
        }

        async fn audio_features(&self, internal_id: &str) -> AppResult<AudioFeatures> {
            let id = internal_id.trim_start_matches("rb-").to_string();
            self.detail_calls.lock().unwrap().push(id.clone());

            if self.failing_details.contains(&id) {
                return Err(AppError::ExternalApi("detail unavailable".to_string()));
            }
            Ok(features_for(&id))
        }
    }

    /// 22-character ids: "A000...0001", "A000...0002", ...
    fn distinct_ids(count: usize) -> Vec<String> {
        (1..=count).map(|i| format!("A{:0>21}", i)).collect()
    }

    #[tokio::test]
    async fn test_duplicates_and_unresolvable_input() {
        let fake = Arc::new(FakeFeatures::knowing([KNOWN.to_string()]));
        let enricher = FeatureEnricher::new(fake.clone());

        let ids = [KNOWN, "not-an-id", KNOWN];
        let result = enricher.enrich(&ids).await;

        assert_eq!(result.len(), 3);
        assert_eq!(result[0].id, KNOWN);
        assert_eq!(result[1].id, "not-an-id");
        assert_eq!(result[2].id, KNOWN);
        assert!(result[0].features.is_some());
        assert_eq!(result[0].features, result[2].features);
        assert!(result[1].features.is_none());

        assert_eq!(fake.lookup_calls(), vec![vec![KNOWN.to_string()]]);
        assert_eq!(fake.detail_calls(), vec![KNOWN.to_string()]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let fake = Arc::new(FakeFeatures::default());
        let enricher = FeatureEnricher::new(fake.clone());

        let result = enricher.enrich::<String>(&[]).await;

        assert!(result.is_empty());
        assert!(fake.lookup_calls().is_empty());
    }

    #[tokio::test]
    async fn test_unresolvable_ids_never_reach_upstream() {
        let fake = Arc::new(FakeFeatures::default());
        let enricher = FeatureEnricher::new(fake.clone());

        let result = enricher.enrich(&["", "nope", "spotify:track:short"]).await;

        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|t| t.features.is_none()));
        assert!(fake.lookup_calls().is_empty());
    }

    #[tokio::test]
    async fn test_mixed_formats_share_one_result() {
        let fake = Arc::new(FakeFeatures::knowing([KNOWN.to_string()]));
        let enricher = FeatureEnricher::new(fake.clone());

        let ids = [
            "spotify:track:4nRhbx8L4ifnMKaE5jSQGR".to_string(),
            "https://open.spotify.com/track/4nRhbx8L4ifnMKaE5jSQGR?si=1".to_string(),
        ];
        let result = enricher.enrich(&ids).await;

        assert_eq!(result[0].id, ids[0]);
        assert_eq!(result[1].id, ids[1]);
        assert!(result[0].features.is_some());
        assert_eq!(result[0].features, result[1].features);
        assert_eq!(fake.lookup_calls(), vec![vec![KNOWN.to_string()]]);
    }

    #[tokio::test]
    async fn test_input_split_into_bounded_batches() {
        let ids = distinct_ids(85);
        let fake = Arc::new(FakeFeatures::knowing(ids.clone()));
        let enricher = FeatureEnricher::new(fake.clone());

        let result = enricher.enrich(&ids).await;

        let sizes: Vec<usize> = fake.lookup_calls().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![40, 40, 5]);
        assert_eq!(result.len(), 85);
        assert!(result.iter().all(|t| t.features.is_some()));
    }

    #[tokio::test]
    async fn test_failed_lookup_only_affects_its_batch() {
        let ids = distinct_ids(6);
        let mut fake = FakeFeatures::knowing(ids.clone());
        fake.failing_lookups.insert(1);
        let fake = Arc::new(fake);
        let enricher = FeatureEnricher::with_batch_size(fake.clone(), 2);

        let result = enricher.enrich(&ids).await;

        assert_eq!(result.len(), 6);
        let present: Vec<bool> = result.iter().map(|t| t.features.is_some()).collect();
        assert_eq!(present, vec![true, true, false, false, true, true]);
        assert_eq!(fake.lookup_calls().len(), 3);
        assert_eq!(result[0].features, Some(features_for(&ids[0])));
        assert_eq!(result[5].features, Some(features_for(&ids[5])));
    }

    #[tokio::test]
    async fn test_failed_detail_only_affects_its_item() {
        let ids = distinct_ids(3);
        let mut fake = FakeFeatures::knowing(ids.clone());
        fake.failing_details.insert(ids[1].clone());
        let fake = Arc::new(fake);
        let enricher = FeatureEnricher::new(fake.clone());

        let result = enricher.enrich(&ids).await;

        assert!(result[0].features.is_some());
        assert!(result[1].features.is_none());
        assert!(result[2].features.is_some());
        assert_eq!(fake.detail_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_ids_stay_absent() {
        let ids = distinct_ids(2);
        let fake = Arc::new(FakeFeatures::knowing([ids[0].clone()]));
        let enricher = FeatureEnricher::new(fake.clone());

        let result = enricher.enrich(&ids).await;

        assert!(result[0].features.is_some());
        assert!(result[1].features.is_none());
        assert_eq!(fake.detail_calls(), vec![ids[0].clone()]);
    }

    #[tokio::test]
    async fn test_enriched_duplicate_in_later_batch_is_not_requested_again() {
        let ids = distinct_ids(2);
        let input = vec![ids[0].clone(), ids[1].clone(), ids[0].clone()];
        let fake = Arc::new(FakeFeatures::knowing(ids.clone()));
        let enricher = FeatureEnricher::with_batch_size(fake.clone(), 2);

        let result = enricher.enrich(&input).await;

        assert_eq!(fake.lookup_calls().len(), 1);
        assert_eq!(fake.detail_calls().len(), 2);
        assert!(result[2].features.is_some());
        assert_eq!(result[0].features, result[2].features);
    }

    #[tokio::test]
    async fn test_duplicate_in_later_batch_recovers_after_failed_lookup() {
        let ids = distinct_ids(3);
        let input = vec![
            ids[0].clone(),
            ids[1].clone(),
            ids[2].clone(),
            ids[0].clone(),
        ];
        let mut fake = FakeFeatures::knowing(ids.clone());
        fake.failing_lookups.insert(0);
        let fake = Arc::new(fake);
        let enricher = FeatureEnricher::with_batch_size(fake.clone(), 2);

        let result = enricher.enrich(&input).await;

        assert_eq!(
            fake.lookup_calls(),
            vec![
                vec![ids[0].clone(), ids[1].clone()],
                vec![ids[2].clone(), ids[0].clone()],
            ]
        );
        assert!(result[0].features.is_some());
        assert_eq!(result[0].features, result[3].features);
        assert!(result[1].features.is_none());
        assert!(result[2].features.is_some());
    }

    #[tokio::test]
    async fn test_duplicates_within_one_batch_are_requested_once() {
        let ids = distinct_ids(2);
        let input = vec![ids[0].clone(), ids[0].clone(), ids[1].clone()];
        let fake = Arc::new(FakeFeatures::knowing(ids.clone()));
        let enricher = FeatureEnricher::new(fake.clone());

        let result = enricher.enrich(&input).await;

        assert_eq!(fake.lookup_calls(), vec![ids.clone()]);
        assert!(result.iter().all(|t| t.features.is_some()));
    }

    #[tokio::test]
    async fn test_duplicates_share_absence_when_batch_fails() {
        let input = vec![KNOWN.to_string(), KNOWN.to_string()];
        let mut fake = FakeFeatures::knowing([KNOWN.to_string()]);
        fake.failing_lookups.insert(0);
        let enricher = FeatureEnricher::new(Arc::new(fake));

        let result = enricher.enrich(&input).await;

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|t| t.features.is_none()));
    }

    #[tokio::test]
    async fn test_unrequested_and_repeated_lookup_items_are_ignored() {
        let mut provider = MockFeatureProvider::new();
        provider.expect_lookup_tracks().times(1).returning(|_| {
            Ok(vec![
                FeatureLookupItem {
                    internal_id: "rb-other".to_string(),
                    track_id: TrackId::parse("0j35X8cTq543QDYLOyqB8W").unwrap(),
                },
                FeatureLookupItem {
                    internal_id: "rb-known".to_string(),
                    track_id: TrackId::parse(KNOWN).unwrap(),
                },
                FeatureLookupItem {
                    internal_id: "rb-known-again".to_string(),
                    track_id: TrackId::parse(KNOWN).unwrap(),
                },
            ])
        });
        provider
            .expect_audio_features()
            .withf(|internal_id| internal_id.to_string() == "rb-known")
            .times(1)
            .returning(|_| Ok(features_for(KNOWN)));

        let enricher = FeatureEnricher::new(Arc::new(provider));
        let result = enricher.enrich(&[KNOWN]).await;

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].features, Some(features_for(KNOWN)));
    }
}

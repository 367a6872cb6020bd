use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    db::RecordStore,
    error::{AppError, AppResult},
    models::{CatalogTrack, EnrichedTrack, Recommendation, SeedPayload, SeedRecord, TrackId},
    services::{
        enrichment::FeatureEnricher,
        exclusions::ExclusionTracker,
        normalizer, prompt,
        providers::{
            spotify::METADATA_BATCH_SIZE, CatalogProvider, FeatureProvider, GenerativeProvider,
        },
        resolver::RecommendationResolver,
        seeds::SeedAggregator,
    },
};

/// Tunables for a recommendation run
#[derive(Debug, Clone)]
pub struct RecommendationSettings {
    pub recommendation_count: usize,
    pub max_tracks_per_artist: usize,
    pub placeholder_image_url: String,
}

/// Runs normalize → enrich → persist → project → generate → resolve
///
/// Every upstream call is awaited in sequence. Only a failing playlist
/// lookup, a failing generative call, unparseable generative output or a
/// storage error abort a run; everything else degrades.
pub struct RecommendationService {
    catalog: Arc<dyn CatalogProvider>,
    generator: Arc<dyn GenerativeProvider>,
    enricher: FeatureEnricher,
    seeds: SeedAggregator,
    exclusions: ExclusionTracker,
    resolver: RecommendationResolver,
    settings: RecommendationSettings,
}

impl RecommendationService {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        features: Arc<dyn FeatureProvider>,
        generator: Arc<dyn GenerativeProvider>,
        seed_store: Arc<dyn RecordStore<SeedRecord>>,
        exclusion_store: Arc<dyn RecordStore<Recommendation>>,
        settings: RecommendationSettings,
    ) -> Self {
        let exclusions = ExclusionTracker::new(exclusion_store);
        let resolver = RecommendationResolver::new(
            catalog.clone(),
            exclusions.clone(),
            settings.max_tracks_per_artist,
            settings.placeholder_image_url.clone(),
        );

        Self {
            catalog,
            generator,
            enricher: FeatureEnricher::new(features),
            seeds: SeedAggregator::new(seed_store),
            exclusions,
            resolver,
            settings,
        }
    }

    /// Recommendations seeded from every track of a playlist
    ///
    /// Accepts a bare playlist id or a playlist URL/URI.
    pub async fn recommend_for_playlist(
        &self,
        raw_playlist_id: &str,
    ) -> AppResult<Vec<Recommendation>> {
        let playlist_id = normalizer::normalize(raw_playlist_id).ok_or_else(|| {
            AppError::InvalidInput(format!("Not a playlist identifier: {}", raw_playlist_id))
        })?;

        let tracks = self.catalog.playlist_tracks(playlist_id.as_str()).await?;
        if tracks.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Playlist {} has no usable tracks",
                playlist_id
            )));
        }

        self.seed_and_recommend(tracks).await
    }

    /// Recommendations seeded from a raw list of track identifiers
    pub async fn recommend_for_tracks(&self, raw_ids: &[String]) -> AppResult<Vec<Recommendation>> {
        if raw_ids.is_empty() {
            return Err(AppError::InvalidInput("Must provide at least one track id".to_string()));
        }

        let ids: Vec<TrackId> = raw_ids
            .iter()
            .filter_map(|raw| normalizer::normalize(raw))
            .collect();

        let tracks = self.lookup_metadata(&ids).await;
        if tracks.is_empty() {
            return Err(AppError::InvalidInput(
                "None of the provided track ids could be resolved".to_string(),
            ));
        }

        self.seed_and_recommend(tracks).await
    }

    /// Aligned audio features for raw identifiers, without persisting
    pub async fn enrich(&self, raw_ids: &[String]) -> Vec<EnrichedTrack> {
        self.enricher.enrich(raw_ids).await
    }

    pub async fn seeds(&self) -> AppResult<Vec<SeedPayload>> {
        self.seeds.project().await
    }

    pub async fn exclusions(&self) -> AppResult<Vec<Recommendation>> {
        self.exclusions.all_excluded().await
    }

    /// Empties the seed set and the exclusion list
    pub async fn reset(&self) -> AppResult<()> {
        self.seeds.clear().await?;
        self.exclusions.clear().await?;
        tracing::info!("Persisted state cleared");
        Ok(())
    }

    /// Catalog metadata in batches; failed batches and unknown ids are skipped
    async fn lookup_metadata(&self, ids: &[TrackId]) -> Vec<CatalogTrack> {
        let mut tracks = Vec::with_capacity(ids.len());

        for (batch_index, batch) in ids.chunks(METADATA_BATCH_SIZE).enumerate() {
            match self.catalog.tracks(batch).await {
                Ok(found) => {
                    for (id, track) in batch.iter().zip(found) {
                        match track {
                            Some(track) => tracks.push(track),
                            None => tracing::debug!(track_id = %id, "Unknown track id"),
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        batch = batch_index,
                        batch_len = batch.len(),
                        "Metadata lookup failed, skipping batch"
                    );
                }
            }
        }

        tracks
    }

    async fn seed_and_recommend(
        &self,
        tracks: Vec<CatalogTrack>,
    ) -> AppResult<Vec<Recommendation>> {
        let start = Instant::now();

        let ids: Vec<&TrackId> = tracks.iter().map(|t| &t.id).collect();
        let enriched = self.enricher.enrich(&ids).await;

        for (track, enriched) in tracks.into_iter().zip(enriched) {
            self.seeds
                .persist(track.id, track.name, track.artists, enriched.features)
                .await?;
        }

        let seeds = self.seeds.project().await?;
        let excluded = self.exclusions.all_excluded().await?;

        let prompt = prompt::build_prompt(
            &seeds,
            &excluded,
            self.settings.recommendation_count,
            self.settings.max_tracks_per_artist,
        )?;

        let output = self.generator.complete(&prompt).await?;
        let candidates = prompt::parse_candidates(&output)?;

        let skip: HashSet<TrackId> = seeds
            .iter()
            .map(|s| s.spotify_id.clone())
            .chain(excluded.iter().map(|r| r.spotify_id.clone()))
            .collect();

        let recommendations = self.resolver.resolve(candidates, &skip).await?;

        tracing::info!(
            seeds = seeds.len(),
            excluded = excluded.len(),
            recommendations = recommendations.len(),
            processing_time_ms = start.elapsed().as_millis(),
            "Recommendation run completed"
        );

        Ok(recommendations)
    }
}

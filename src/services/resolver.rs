use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Candidate, Image, Recommendation, TrackId},
    services::{exclusions::ExclusionTracker, providers::CatalogProvider},
};

/// Preferred artwork edge length in pixels
pub const ARTWORK_SIZE: u32 = 640;

/// Turns generative candidates into resolved recommendations
///
/// Output is never longer than the input: candidates without a search match,
/// or whose search fails, are dropped. Artwork problems never drop a
/// candidate; they fall back to the first image, then to a placeholder.
/// On top of that, resolved tracks that are seeds, were recommended before,
/// repeat within this run, or exceed the per-artist cap are dropped.
pub struct RecommendationResolver {
    catalog: Arc<dyn CatalogProvider>,
    exclusions: ExclusionTracker,
    max_per_artist: usize,
    placeholder_image_url: String,
}

impl RecommendationResolver {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        exclusions: ExclusionTracker,
        max_per_artist: usize,
        placeholder_image_url: String,
    ) -> Self {
        Self {
            catalog,
            exclusions,
            max_per_artist,
            placeholder_image_url,
        }
    }

    /// Resolves candidates in order and records each result as excluded
    ///
    /// `skip` holds identifiers that must not be returned (seeds and prior
    /// recommendations). Only storage failures are returned as errors.
    pub async fn resolve(
        &self,
        candidates: Vec<Candidate>,
        skip: &HashSet<TrackId>,
    ) -> AppResult<Vec<Recommendation>> {
        let total = candidates.len();
        let mut returned: HashSet<TrackId> = HashSet::new();
        let mut per_artist: HashMap<String, usize> = HashMap::new();
        let mut resolved = Vec::new();

        for candidate in candidates {
            let artist_text = candidate.artists.join(",");

            let track = match self.catalog.search_track(&candidate.name, &artist_text).await {
                Ok(Some(track)) => track,
                Ok(None) => {
                    tracing::debug!(
                        name = %candidate.name,
                        artist = %artist_text,
                        "No catalog match, dropping candidate"
                    );
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        name = %candidate.name,
                        "Catalog search failed, dropping candidate"
                    );
                    continue;
                }
            };

            if skip.contains(&track.id) || returned.contains(&track.id) {
                tracing::debug!(track_id = %track.id, "Dropping repeated recommendation");
                continue;
            }

            let artist_keys: Vec<String> = candidate
                .artists
                .iter()
                .map(|a| a.trim().to_lowercase())
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();

            if self.max_per_artist > 0
                && artist_keys
                    .iter()
                    .any(|a| per_artist.get(a).copied().unwrap_or(0) >= self.max_per_artist)
            {
                tracing::debug!(
                    name = %candidate.name,
                    artist = %artist_text,
                    "Artist cap reached, dropping candidate"
                );
                continue;
            }

            let image_url = self.artwork_url(&track.id).await;

            let recommendation = Recommendation {
                name: candidate.name,
                artists: candidate.artists,
                spotify_id: track.id.clone(),
                image_url,
                recommended_at: Utc::now(),
            };

            self.exclusions.record(&recommendation).await?;

            for artist in artist_keys {
                *per_artist.entry(artist).or_insert(0) += 1;
            }
            returned.insert(track.id);
            resolved.push(recommendation);
        }

        tracing::info!(
            candidates = total,
            resolved = resolved.len(),
            "Recommendations resolved"
        );

        Ok(resolved)
    }

    /// Artwork for a resolved track; never fails
    async fn artwork_url(&self, id: &TrackId) -> String {
        match self.catalog.track_images(id).await {
            Ok(images) => pick_artwork(&images).unwrap_or_else(|| {
                tracing::debug!(track_id = %id, "Track has no artwork, using placeholder");
                self.placeholder_image_url.clone()
            }),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    track_id = %id,
                    "Artwork lookup failed, using placeholder"
                );
                self.placeholder_image_url.clone()
            }
        }
    }
}

/// The exact preferred size if present, otherwise the first image
fn pick_artwork(images: &[Image]) -> Option<String> {
    images
        .iter()
        .find(|img| img.height == Some(ARTWORK_SIZE))
        .or_else(|| images.first())
        .map(|img| img.url.clone())
}

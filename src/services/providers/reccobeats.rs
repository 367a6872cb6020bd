//! ReccoBeats audio-feature provider
//!
//! API flow:
//! 1. Lookup: /v1/track?ids=a,b,c → the subset of catalog ids ReccoBeats knows,
//!    each with a ReccoBeats id and an `href` back to the catalog track
//! 2. Detail: /v1/track/{reccobeats_id}/audio-features → feature vector

use crate::{
    error::{AppError, AppResult},
    models::{AudioFeatures, FeatureLookupItem, ReccoLookupResponse, TrackId},
    services::providers::FeatureProvider,
};
use reqwest::Client as HttpClient;

#[derive(Clone)]
pub struct ReccoBeatsProvider {
    http_client: HttpClient,
    api_url: String,
}

impl ReccoBeatsProvider {
    pub fn new(http_client: HttpClient, api_url: String) -> Self {
        Self {
            http_client,
            api_url,
        }
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> AppResult<reqwest::Response> {
        let response = self
            .http_client
            .get(url)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "ReccoBeats API returned status {}: {}",
                status, body
            )));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl FeatureProvider for ReccoBeatsProvider {
    async fn lookup_tracks(&self, ids: &[TrackId]) -> AppResult<Vec<FeatureLookupItem>> {
        let joined = ids
            .iter()
            .map(TrackId::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let url = format!("{}/v1/track", self.api_url);
        let lookup: ReccoLookupResponse = self
            .get(&url, &[("ids", joined.as_str())])
            .await?
            .json()
            .await?;

        let received = lookup.content.len();
        let items: Vec<FeatureLookupItem> = lookup
            .content
            .into_iter()
            .filter_map(|track| {
                let href = track.href.clone();
                let item = track.into_lookup_item();
                if item.is_none() {
                    tracing::debug!(href = %href, "Lookup item without a catalog id in href");
                }
                item
            })
            .collect();

        tracing::debug!(
            requested = ids.len(),
            received = received,
            mapped = items.len(),
            provider = "reccobeats",
            "Track lookup completed"
        );

        Ok(items)
    }

    async fn audio_features(&self, internal_id: &str) -> AppResult<AudioFeatures> {
        let url = format!("{}/v1/track/{}/audio-features", self.api_url, internal_id);
        let response_text = self.get(&url, &[]).await?.text().await?;

        // Decoding into the typed record drops `id` and `href` and rejects
        // payloads missing any feature.
        serde_json::from_str(&response_text).map_err(|e| {
            tracing::debug!(
                error = %e,
                response = %response_text,
                "Failed to decode audio features"
            );
            AppError::ExternalApi(format!("Incomplete audio features for {}: {}", internal_id, e))
        })
    }
}

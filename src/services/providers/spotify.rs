//! Spotify Web API provider
//!
//! Catalog metadata, playlist contents, track search and album artwork.
//! Authenticates with the client-credentials flow; the access token is kept
//! in memory and refreshed shortly before it expires.

use crate::{
    error::{AppError, AppResult},
    models::{
        CatalogTrack, Image, SpotifyPage, SpotifyPlaylist, SpotifyPlaylistItem,
        SpotifySearchResponse, SpotifyToken, SpotifyTrack, SpotifyTracksResponse, TrackId,
    },
    services::providers::CatalogProvider,
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Maximum ids accepted by GET /v1/tracks
pub const METADATA_BATCH_SIZE: usize = 50;

/// Refresh the token this long before Spotify expires it
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

pub struct SpotifyProvider {
    http_client: HttpClient,
    client_id: String,
    client_secret: String,
    api_url: String,
    accounts_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyProvider {
    pub fn new(
        http_client: HttpClient,
        client_id: String,
        client_secret: String,
        api_url: String,
        accounts_url: String,
    ) -> Self {
        Self {
            http_client,
            client_id,
            client_secret,
            api_url,
            accounts_url,
            token: Mutex::new(None),
        }
    }

    /// Returns a valid access token, fetching a new one when needed
    async fn access_token(&self) -> AppResult<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.access_token.clone());
            }
        }

        let url = format!("{}/api/token", self.accounts_url);
        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Spotify token request returned status {}: {}",
                status, body
            )));
        }

        let token: SpotifyToken = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);

        tracing::debug!(expires_in = token.expires_in, "Spotify access token refreshed");

        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }

    /// Authenticated GET returning a decoded JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> AppResult<T> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Spotify resource {}", url)));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Spotify API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

/// Field-filtered search query, e.g. `track:Shape of You artist:Ed Sheeran`
fn search_query(name: &str, artist: &str) -> String {
    format!("track:{} artist:{}", name, artist)
}

fn collect_playlist_items(items: Vec<SpotifyPlaylistItem>, tracks: &mut Vec<CatalogTrack>) {
    tracks.extend(
        items
            .into_iter()
            .filter_map(|item| item.track)
            .filter_map(SpotifyTrack::into_catalog_track),
    );
}

#[async_trait::async_trait]
impl CatalogProvider for SpotifyProvider {
    async fn playlist_tracks(&self, playlist_id: &str) -> AppResult<Vec<CatalogTrack>> {
        let url = format!("{}/v1/playlists/{}", self.api_url, playlist_id);
        let playlist: SpotifyPlaylist = self.get_json(&url, &[]).await?;

        let mut tracks = Vec::new();
        let mut next = playlist.tracks.next;
        collect_playlist_items(playlist.tracks.items, &mut tracks);

        while let Some(next_url) = next {
            let page: SpotifyPage<SpotifyPlaylistItem> = self.get_json(&next_url, &[]).await?;
            next = page.next;
            collect_playlist_items(page.items, &mut tracks);
        }

        tracing::info!(
            playlist_id = %playlist_id,
            tracks = tracks.len(),
            provider = "spotify",
            "Playlist fetched"
        );

        Ok(tracks)
    }

    async fn tracks(&self, ids: &[TrackId]) -> AppResult<Vec<Option<CatalogTrack>>> {
        if ids.len() > METADATA_BATCH_SIZE {
            return Err(AppError::InvalidInput(format!(
                "At most {} ids per metadata lookup, got {}",
                METADATA_BATCH_SIZE,
                ids.len()
            )));
        }

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = ids
            .iter()
            .map(TrackId::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let url = format!("{}/v1/tracks", self.api_url);
        let response: SpotifyTracksResponse =
            self.get_json(&url, &[("ids", joined.as_str())]).await?;

        if response.tracks.len() != ids.len() {
            return Err(AppError::ExternalApi(format!(
                "Spotify returned {} entries for {} ids",
                response.tracks.len(),
                ids.len()
            )));
        }

        Ok(response
            .tracks
            .into_iter()
            .map(|track| track.and_then(SpotifyTrack::into_catalog_track))
            .collect())
    }

    async fn search_track(&self, name: &str, artist: &str) -> AppResult<Option<CatalogTrack>> {
        let url = format!("{}/v1/search", self.api_url);
        let query = search_query(name, artist);

        let response: SpotifySearchResponse = self
            .get_json(
                &url,
                &[("q", query.as_str()), ("type", "track"), ("limit", "1")],
            )
            .await?;

        let found = response
            .tracks
            .items
            .into_iter()
            .next()
            .and_then(SpotifyTrack::into_catalog_track);

        tracing::debug!(
            query = %query,
            matched = found.is_some(),
            provider = "spotify",
            "Track search completed"
        );

        Ok(found)
    }

    async fn track_images(&self, id: &TrackId) -> AppResult<Vec<Image>> {
        let url = format!("{}/v1/tracks/{}", self.api_url, id);
        let track: SpotifyTrack = self.get_json(&url, &[]).await?;

        Ok(track
            .album
            .map(|album| album.images.into_iter().map(Image::from).collect())
            .unwrap_or_default())
    }
}

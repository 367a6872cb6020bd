use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::services::normalizer;

mod features;
mod recommendation;

pub use features::{AudioFeatures, EnrichedTrack, SeedPayload, SeedRecord};
pub use recommendation::{Candidate, Recommendation};

/// Canonical 22-character catalog track identifier (e.g. "4nRhbx8L4ifnMKaE5jSQGR")
///
/// Only produced by [`normalizer::normalize`], so every value held by the
/// pipeline is already in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Extracts a canonical id from a bare id, URI or URL
    pub fn parse(raw: &str) -> Option<Self> {
        normalizer::normalize(raw)
    }

    pub(crate) fn from_canonical(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TrackId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A track as known to the catalog service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub id: TrackId,
    pub name: String,
    pub artists: Vec<String>,
}

/// Album artwork entry
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
}

/// A lookup hit from the feature service, carrying the id needed for the detail call
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLookupItem {
    /// Identifier assigned by the feature service
    pub internal_id: String,
    /// Catalog identifier the feature service resolved this item from
    pub track_id: TrackId,
}

// ============================================================================
// Spotify Web API Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyToken {
    pub access_token: String,
    pub expires_in: u64,
}

/// A page of a paged Spotify collection
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPage<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylist {
    pub tracks: SpotifyPage<SpotifyPlaylistItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylistItem {
    /// Null for removed or unavailable entries
    #[serde(default)]
    pub track: Option<SpotifyTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrack {
    /// Null for local files
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    #[serde(default)]
    pub album: Option<SpotifyAlbum>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyAlbum {
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Response of GET /v1/tracks?ids=...
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTracksResponse {
    pub tracks: Vec<Option<SpotifyTrack>>,
}

/// Response of GET /v1/search?type=track
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifySearchResponse {
    pub tracks: SpotifyPage<SpotifyTrack>,
}

impl SpotifyTrack {
    /// Converts to a catalog track, or `None` when the track has no usable id
    pub fn into_catalog_track(self) -> Option<CatalogTrack> {
        let id = self.id.as_deref().and_then(TrackId::parse)?;

        Some(CatalogTrack {
            id,
            name: self.name,
            artists: self.artists.into_iter().map(|a| a.name).collect(),
        })
    }
}

impl From<SpotifyImage> for Image {
    fn from(image: SpotifyImage) -> Self {
        Image {
            url: image.url,
            height: image.height,
        }
    }
}

// ============================================================================
// ReccoBeats API Types
// ============================================================================

/// Response of GET /v1/track?ids=...
#[derive(Debug, Clone, Deserialize)]
pub struct ReccoLookupResponse {
    #[serde(default)]
    pub content: Vec<ReccoTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReccoTrack {
    /// ReccoBeats' own id, required for the audio-features call
    pub id: String,
    /// Link to the catalog track this entry was resolved from
    pub href: String,
}

impl ReccoTrack {
    /// Pairs the internal id with the catalog id found in `href`
    pub fn into_lookup_item(self) -> Option<FeatureLookupItem> {
        let track_id = TrackId::parse(&self.href)?;

        Some(FeatureLookupItem {
            internal_id: self.id,
            track_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_id_display() {
        let id = TrackId::parse("4nRhbx8L4ifnMKaE5jSQGR").unwrap();
        assert_eq!(format!("{}", id), "4nRhbx8L4ifnMKaE5jSQGR");
    }

    #[test]
    fn test_track_id_serializes_as_plain_string() {
        let id = TrackId::parse("spotify:track:4nRhbx8L4ifnMKaE5jSQGR").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""4nRhbx8L4ifnMKaE5jSQGR""#);
    }

    #[test]
    fn test_spotify_track_to_catalog_track() {
        let json = r#"{
            "id": "4nRhbx8L4ifnMKaE5jSQGR",
            "name": "Midnight City",
            "artists": [{"name": "M83"}, {"name": "Guest"}]
        }"#;

        let track: SpotifyTrack = serde_json::from_str(json).unwrap();
        let catalog = track.into_catalog_track().unwrap();

        assert_eq!(catalog.id.as_str(), "4nRhbx8L4ifnMKaE5jSQGR");
        assert_eq!(catalog.name, "Midnight City");
        assert_eq!(catalog.artists, vec!["M83".to_string(), "Guest".to_string()]);
    }

    #[test]
    fn test_local_file_track_has_no_catalog_form() {
        let json = r#"{"id": null, "name": "demo.mp3", "artists": []}"#;
        let track: SpotifyTrack = serde_json::from_str(json).unwrap();
        assert!(track.into_catalog_track().is_none());
    }

    #[test]
    fn test_tracks_response_keeps_null_placeholders() {
        let json = r#"{
            "tracks": [null, {"id": "4nRhbx8L4ifnMKaE5jSQGR", "name": "A", "artists": []}]
        }"#;
        let response: SpotifyTracksResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.tracks.len(), 2);
        assert!(response.tracks[0].is_none());
        assert!(response.tracks[1].is_some());
    }

    #[test]
    fn test_recco_track_maps_href_to_catalog_id() {
        let json = r#"{
            "id": "a1b2c3d4-0000-1111-2222-333344445555",
            "href": "https://open.spotify.com/track/4nRhbx8L4ifnMKaE5jSQGR"
        }"#;

        let track: ReccoTrack = serde_json::from_str(json).unwrap();
        let item = track.into_lookup_item().unwrap();

        assert_eq!(item.internal_id, "a1b2c3d4-0000-1111-2222-333344445555");
        assert_eq!(item.track_id.as_str(), "4nRhbx8L4ifnMKaE5jSQGR");
    }

    #[test]
    fn test_recco_lookup_response_tolerates_missing_content() {
        let response: ReccoLookupResponse = serde_json::from_str("{}").unwrap();
        assert!(response.content.is_empty());
    }
}

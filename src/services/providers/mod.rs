//! External collaborators
//!
//! Each upstream service sits behind a trait so the pipeline can be driven by
//! fakes in tests. Implementations surface transport failures and non-success
//! statuses as errors; deciding whether a failure is fatal is left to the
//! caller.

use crate::{
    error::AppResult,
    models::{AudioFeatures, CatalogTrack, FeatureLookupItem, Image, TrackId},
};

pub mod gemini;
pub mod reccobeats;
pub mod spotify;

pub use gemini::GeminiProvider;
pub use reccobeats::ReccoBeatsProvider;
pub use spotify::SpotifyProvider;

/// Track catalog: playlists, metadata, search and artwork
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Every track of a playlist, in playlist order
    ///
    /// `playlist_id` is a canonical 22-character catalog id.
    async fn playlist_tracks(&self, playlist_id: &str) -> AppResult<Vec<CatalogTrack>>;

    /// Metadata for up to [`spotify::METADATA_BATCH_SIZE`] ids, one entry per id
    async fn tracks(&self, ids: &[TrackId]) -> AppResult<Vec<Option<CatalogTrack>>>;

    /// Best match for a track name and artist text, if any
    async fn search_track(&self, name: &str, artist: &str) -> AppResult<Option<CatalogTrack>>;

    /// Album images of a track, as ordered by the catalog
    async fn track_images(&self, id: &TrackId) -> AppResult<Vec<Image>>;
}

/// Audio-feature service with a lookup-then-detail protocol
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FeatureProvider: Send + Sync {
    /// Resolves catalog ids to the service's own ids; unknown ids are omitted
    async fn lookup_tracks(&self, ids: &[TrackId]) -> AppResult<Vec<FeatureLookupItem>>;

    /// Audio features for one service-internal id
    async fn audio_features(&self, internal_id: &str) -> AppResult<AudioFeatures>;
}

/// Text-completion service
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GenerativeProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> AppResult<String>;
}

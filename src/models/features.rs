use serde::{Deserialize, Serialize};

use super::TrackId;

/// Audio-feature vector for one track
///
/// Every field is required: an upstream payload missing any of them fails to
/// decode, so a record is either complete or absent. Bookkeeping fields sent
/// by the feature service (`id`, `href`) are not part of the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub tempo: f64,
    pub danceability: f64,
    pub energy: f64,
    pub valence: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub loudness: f64,
    pub speechiness: f64,
    pub key: i32,
    pub mode: i32,
    pub time_signature: i32,
}

/// One position of an enrichment result
///
/// `id` is the caller's raw input at this position, unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedTrack {
    pub id: String,
    pub features: Option<AudioFeatures>,
}

/// A persisted seed track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRecord {
    pub spotify_id: TrackId,
    pub name: String,
    pub artists: Vec<String>,
    pub features: Option<AudioFeatures>,
}

/// Flattened seed, the shape embedded in the recommendation prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedPayload {
    pub spotify_id: TrackId,
    pub name: String,
    pub artists: Vec<String>,
    pub tempo: Option<f64>,
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub valence: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub loudness: Option<f64>,
    pub speechiness: Option<f64>,
    pub key: Option<i32>,
    pub mode: Option<i32>,
    pub time_signature: Option<i32>,
}

impl From<SeedRecord> for SeedPayload {
    fn from(record: SeedRecord) -> Self {
        let f = record.features.as_ref();

        SeedPayload {
            spotify_id: record.spotify_id,
            name: record.name,
            artists: record.artists,
            tempo: f.map(|f| f.tempo),
            danceability: f.map(|f| f.danceability),
            energy: f.map(|f| f.energy),
            valence: f.map(|f| f.valence),
            acousticness: f.map(|f| f.acousticness),
            instrumentalness: f.map(|f| f.instrumentalness),
            liveness: f.map(|f| f.liveness),
            loudness: f.map(|f| f.loudness),
            speechiness: f.map(|f| f.speechiness),
            key: f.map(|f| f.key),
            mode: f.map(|f| f.mode),
            time_signature: f.map(|f| f.time_signature),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::TrackId;

/// A track suggested by the generative service, not yet resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    /// Accepts a single string as well as a list
    #[serde(rename = "artist", alias = "artists", deserialize_with = "one_or_many")]
    pub artists: Vec<String>,
}

/// A resolved recommendation
///
/// Only constructed once the catalog search matched, so the identifier and
/// artwork are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub artists: Vec<String>,
    pub spotify_id: TrackId,
    pub image_url: String,
    pub recommended_at: DateTime<Utc>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(artist) => vec![artist],
        OneOrMany::Many(artists) => artists,
    })
}

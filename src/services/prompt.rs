use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{Candidate, Recommendation, SeedPayload},
};

/// Tempo tolerance around the median seed tempo, as a fraction
const TEMPO_TOLERANCE: f64 = 0.08;

/// Compact form of a past recommendation for the "do not repeat" list
#[derive(Serialize)]
struct ExcludedTrack<'a> {
    name: &'a str,
    artist: &'a [String],
}

/// Builds the recommendation prompt from the seed profile and exclusion list
pub fn build_prompt(
    seeds: &[SeedPayload],
    excluded: &[Recommendation],
    count: usize,
    max_per_artist: usize,
) -> AppResult<String> {
    let seeds_json = serde_json::to_string_pretty(seeds)
        .map_err(|e| AppError::Internal(format!("Seed serialization error: {}", e)))?;

    let excluded: Vec<ExcludedTrack> = excluded
        .iter()
        .map(|r| ExcludedTrack {
            name: &r.name,
            artist: &r.artists,
        })
        .collect();
    let excluded_json = serde_json::to_string(&excluded)
        .map_err(|e| AppError::Internal(format!("Exclusion serialization error: {}", e)))?;

    let tempo_rule = match median_tempo(seeds) {
        Some(median) => format!(
            "keep tempo within ±{:.0}% of the median seed tempo ({:.1} BPM)",
            TEMPO_TOLERANCE * 100.0,
            median
        ),
        None => format!(
            "keep tempo within ±{:.0}% of the median seed tempo",
            TEMPO_TOLERANCE * 100.0
        ),
    };

    Ok(format!(
        r#"SYSTEM:
You are a music recommendation assistant. Output ONLY a JSON list (array) of EXACTLY {count} objects.
Each object MUST have exactly these keys with these types:
"name": string (track title)
"artist": array of strings (list of artist names; use a list even if there is only one artist)
No other text, no markdown, no extra keys.

INSTRUCTIONS:
Input is an array of seed songs with audio features and artist names. Some seeds may have null features; use their names and artists only.
Recommend {count} DISTINCT tracks that are similar to the overall seed profile.
You MUST infer likely genres of the seeds from your knowledge of the tracks/artists and use those inferred genres when selecting recommendations.
Do NOT return any seed tracks.
Do NOT return any track listed in PREVIOUSLY_RECOMMENDED_JSON.
Diversity: cap at {max_per_artist} tracks involving the same artist name (across any position in the artist list).

OPTIMIZATION (in order):
1) Match audio profile: {tempo_rule}; prefer similar danceability, energy, and valence; respect mode and time_signature when helpful.
2) Incorporate inferred genres: align with the top inferred genres; include a mix across those genres.

SEEDS_JSON:
{seeds_json}

PREVIOUSLY_RECOMMENDED_JSON:
{excluded_json}

OUTPUT SHAPE EXAMPLE (structure only):
[
  {{"name": "Track Title 1", "artist": ["Primary Artist 1"]}},
  {{"name": "Track Title 2", "artist": ["Artist A", "Artist B"]}},
  ...
]
Return ONLY the JSON array ({count} items)."#
    ))
}

/// Median tempo over seeds that have features
fn median_tempo(seeds: &[SeedPayload]) -> Option<f64> {
    let mut tempos: Vec<f64> = seeds.iter().filter_map(|s| s.tempo).collect();
    if tempos.is_empty() {
        return None;
    }

    tempos.sort_by(|a, b| a.total_cmp(b));
    let mid = tempos.len() / 2;

    Some(if tempos.len() % 2 == 0 {
        (tempos[mid - 1] + tempos[mid]) / 2.0
    } else {
        tempos[mid]
    })
}

/// Removes a surrounding markdown code fence (```json ... ``` or ``` ... ```)
pub fn strip_markdown_fence(raw: &str) -> &str {
    let mut text = raw.trim();

    if text.get(..7).is_some_and(|tag| tag.eq_ignore_ascii_case("```json")) {
        text = text[7..].trim();
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest.trim();
    }

    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim();
    }

    text
}

/// Parses generative output into candidates
///
/// Anything that is not a JSON array of `{name, artist}` objects after fence
/// stripping is an [`AppError::UpstreamFormat`] and fails the whole run.
pub fn parse_candidates(raw: &str) -> AppResult<Vec<Candidate>> {
    let text = strip_markdown_fence(raw);

    serde_json::from_str(text).map_err(|e| {
        tracing::error!(error = %e, response = %raw, "Generative output is not a candidate list");
        AppError::UpstreamFormat(format!("Could not parse recommendations: {}", e))
    })
}

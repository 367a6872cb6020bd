use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult, middleware::RequestId, models::Recommendation, routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct PlaylistRequest {
    /// Bare playlist id, `spotify:playlist:` URI or open.spotify.com URL
    pub playlist_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TracksRequest {
    pub track_ids: Vec<String>,
}

/// Handler for playlist-seeded recommendations
pub async fn from_playlist(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<PlaylistRequest>,
) -> AppResult<Json<Vec<Recommendation>>> {
    tracing::info!(
        request_id = %request_id,
        playlist_id = %request.playlist_id,
        "Processing playlist recommendation request"
    );

    let recommendations = state
        .recommendations
        .recommend_for_playlist(&request.playlist_id)
        .await?;

    tracing::info!(
        request_id = %request_id,
        count = recommendations.len(),
        "Playlist recommendations completed"
    );

    Ok(Json(recommendations))
}

/// Handler for recommendations seeded from raw track ids
pub async fn from_tracks(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<TracksRequest>,
) -> AppResult<Json<Vec<Recommendation>>> {
    tracing::info!(
        request_id = %request_id,
        track_count = request.track_ids.len(),
        "Processing track recommendation request"
    );

    let recommendations = state
        .recommendations
        .recommend_for_tracks(&request.track_ids)
        .await?;

    tracing::info!(
        request_id = %request_id,
        count = recommendations.len(),
        "Track recommendations completed"
    );

    Ok(Json(recommendations))
}

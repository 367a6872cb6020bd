use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    middleware::RequestId, models::EnrichedTrack, routes::recommendations::TracksRequest,
    routes::AppState,
};

/// Handler for aligned audio-feature enrichment
///
/// Never fails on upstream errors; affected positions come back with
/// `features: null`.
pub async fn enrich(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<TracksRequest>,
) -> Json<Vec<EnrichedTrack>> {
    let enriched = state.recommendations.enrich(&request.track_ids).await;

    tracing::info!(
        request_id = %request_id,
        requested = request.track_ids.len(),
        with_features = enriched.iter().filter(|t| t.features.is_some()).count(),
        "Enrichment completed"
    );

    Json(enriched)
}

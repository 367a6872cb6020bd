use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Recommendation, SeedPayload},
    routes::AppState,
};

/// Current seed projection
pub async fn seeds(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<SeedPayload>>> {
    Ok(Json(state.recommendations.seeds().await?))
}

/// Every recommendation returned so far
pub async fn exclusions(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<Recommendation>>> {
    Ok(Json(state.recommendations.exclusions().await?))
}

/// Clears seeds and exclusions
pub async fn reset(State(state): State<Arc<AppState>>) -> AppResult<StatusCode> {
    state.recommendations.reset().await?;
    Ok(StatusCode::NO_CONTENT)
}

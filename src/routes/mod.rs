use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::{make_span_with_request_id, request_id_middleware},
    services::recommendations::RecommendationService,
};

pub mod admin;
pub mod enrich;
pub mod recommendations;

/// Shared application state
pub struct AppState {
    pub recommendations: RecommendationService,
}

/// Creates the application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations/playlist", post(recommendations::from_playlist))
        .route("/recommendations/tracks", post(recommendations::from_tracks))
        .route("/enrich", post(enrich::enrich))
        .route("/seeds", get(admin::seeds))
        .route("/exclusions", get(admin::exclusions))
        .route("/admin/state", delete(admin::reset))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

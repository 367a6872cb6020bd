use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use swipetune_api::{
    config::Config,
    db::{create_redis_client, MemoryStore, RecordStore, RedisStore, StoreKey},
    models::{Recommendation, SeedRecord},
    routes::{create_router, AppState},
    services::{
        providers::{GeminiProvider, ReccoBeatsProvider, SpotifyProvider},
        recommendations::{RecommendationService, RecommendationSettings},
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swipetune_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;

    let seed_store: Arc<dyn RecordStore<SeedRecord>>;
    let exclusion_store: Arc<dyn RecordStore<Recommendation>>;

    match &config.redis_url {
        Some(redis_url) => {
            let client = create_redis_client(redis_url)?;
            seed_store = Arc::new(RedisStore::<SeedRecord>::new(
                client.clone(),
                StoreKey::Seeds,
            ));
            exclusion_store = Arc::new(RedisStore::<Recommendation>::new(
                client,
                StoreKey::Exclusions,
            ));
            tracing::info!("Persisting seeds and exclusions in Redis");
        }
        None => {
            seed_store = Arc::new(MemoryStore::<SeedRecord>::new());
            exclusion_store = Arc::new(MemoryStore::<Recommendation>::new());
            tracing::warn!("REDIS_URL not set, seeds and exclusions are kept in memory");
        }
    }

    let catalog = Arc::new(SpotifyProvider::new(
        http_client.clone(),
        config.spotify_client_id.clone(),
        config.spotify_client_secret.clone(),
        config.spotify_api_url.clone(),
        config.spotify_accounts_url.clone(),
    ));
    let features = Arc::new(ReccoBeatsProvider::new(
        http_client.clone(),
        config.reccobeats_api_url.clone(),
    ));
    let generator = Arc::new(GeminiProvider::new(
        http_client,
        config.gemini_api_key.clone(),
        config.gemini_api_url.clone(),
        config.gemini_model.clone(),
    ));

    let recommendations = RecommendationService::new(
        catalog,
        features,
        generator,
        seed_store,
        exclusion_store,
        RecommendationSettings {
            recommendation_count: config.recommendation_count,
            max_tracks_per_artist: config.max_tracks_per_artist,
            placeholder_image_url: config.placeholder_image_url.clone(),
        },
    );

    let state = Arc::new(AppState { recommendations });
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

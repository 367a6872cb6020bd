use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Spotify client-credentials id
    pub spotify_client_id: String,

    /// Spotify client-credentials secret
    pub spotify_client_secret: String,

    /// Spotify Web API base URL
    #[serde(default = "default_spotify_api_url")]
    pub spotify_api_url: String,

    /// Spotify accounts (token) base URL
    #[serde(default = "default_spotify_accounts_url")]
    pub spotify_accounts_url: String,

    /// ReccoBeats API base URL
    #[serde(default = "default_reccobeats_api_url")]
    pub reccobeats_api_url: String,

    /// Gemini API key
    pub gemini_api_key: String,

    /// Gemini API base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Gemini model used for recommendations
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Redis connection URL. Seeds and exclusions stay in memory when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Per-call timeout for every upstream request, in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Number of tracks requested from the generative service
    #[serde(default = "default_recommendation_count")]
    pub recommendation_count: usize,

    /// Maximum resolved recommendations sharing one artist
    #[serde(default = "default_max_tracks_per_artist")]
    pub max_tracks_per_artist: usize,

    /// Artwork used when a resolved track has no usable image
    #[serde(default = "default_placeholder_image_url")]
    pub placeholder_image_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_spotify_api_url() -> String {
    "https://api.spotify.com".to_string()
}

fn default_spotify_accounts_url() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_reccobeats_api_url() -> String {
    "https://api.reccobeats.com".to_string()
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_http_timeout_secs() -> u64 {
    15
}

fn default_recommendation_count() -> usize {
    30
}

fn default_max_tracks_per_artist() -> usize {
    2
}

fn default_placeholder_image_url() -> String {
    "https://placehold.co/640x640?text=No+Artwork".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_fields() {
        let vars = vec![
            ("SPOTIFY_CLIENT_ID".to_string(), "id".to_string()),
            ("SPOTIFY_CLIENT_SECRET".to_string(), "secret".to_string()),
            ("GEMINI_API_KEY".to_string(), "key".to_string()),
        ];

        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.http_timeout_secs, 15);
        assert_eq!(config.recommendation_count, 30);
        assert_eq!(config.max_tracks_per_artist, 2);
        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert_eq!(config.redis_url, None);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_missing_credentials_is_an_error() {
        let vars: Vec<(String, String)> = vec![("PORT".to_string(), "8080".to_string())];
        assert!(envy::from_iter::<_, Config>(vars).is_err());
    }
}

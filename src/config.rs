use serde::Deserialize;

use crate::services::recommendations::{FallbackPolicy, RecommendationSettings};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Popularity ranking export (movie metadata in popularity order)
    #[serde(default = "default_movies_path")]
    pub movies_path: String,

    /// Item-item similarity matrix export
    #[serde(default = "default_similarity_path")]
    pub similarity_path: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of recommendations returned per request
    #[serde(default = "default_recommendation_count")]
    pub recommendation_count: usize,

    /// Number of movies offered to the user for rating
    #[serde(default = "default_display_count")]
    pub display_count: usize,

    /// When popularity backfill kicks in
    #[serde(default)]
    pub fallback_policy: FallbackPolicy,
}

fn default_movies_path() -> String {
    "data/popular_100.csv".to_string()
}

fn default_similarity_path() -> String {
    "data/pop_100_S.csv".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_recommendation_count() -> usize {
    10
}

fn default_display_count() -> usize {
    100
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.recommendation_count == 0 {
            anyhow::bail!("RECOMMENDATION_COUNT must be at least 1");
        }
        Ok(())
    }

    pub fn recommendation_settings(&self) -> RecommendationSettings {
        RecommendationSettings {
            recommendation_count: self.recommendation_count,
            fallback_policy: self.fallback_policy,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

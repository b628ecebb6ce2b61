use std::sync::Arc;

use crate::{
    catalog::Catalog, config::Config, error::AppResult, services::RecommendationSettings,
};

/// Shared application state
///
/// Everything here is fixed once the server starts; requests only read it.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub settings: RecommendationSettings,
    /// Default number of movies offered for rating
    pub display_count: usize,
}

impl AppState {
    pub fn new(catalog: Catalog, settings: RecommendationSettings, display_count: usize) -> Self {
        Self {
            catalog: Arc::new(catalog),
            settings,
            display_count,
        }
    }

    /// Loads the startup artifacts named by the configuration
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let catalog = Catalog::load(&config.movies_path, &config.similarity_path)?;
        Ok(Self::new(
            catalog,
            config.recommendation_settings(),
            config.display_count,
        ))
    }
}

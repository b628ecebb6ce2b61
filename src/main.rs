use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use movie_recommender::{
    api::{create_router, AppState},
    config::Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    // Artifacts are loaded before the listener is bound; a bad table means no serving
    let state = AppState::from_config(&config).with_context(|| {
        format!(
            "Failed to load catalog from {} and {}",
            config.movies_path, config.similarity_path
        )
    })?;

    let settings = state.settings;
    tracing::info!(
        movies = state.catalog.len(),
        defined_similarities = state.catalog.similarity().defined_count(),
        recommendation_count = settings.recommendation_count,
        fallback_policy = ?settings.fallback_policy,
        "Catalog loaded"
    );

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(address = %address, "Server running");

    axum::serve(listener, app).await?;
    Ok(())
}

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{Movie, MovieId},
    services::{
        build_rating_vector, display_candidates, Recommendation, RecommendationSource,
        Recommender,
    },
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct MoviesQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    /// Movie id -> rating; movies left out are unrated
    #[serde(default)]
    pub ratings: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize)]
pub struct RecommendedMovie {
    pub movie_id: MovieId,
    pub title: String,
    pub rank: usize,
    pub review_count: Option<u32>,
    pub predicted_rating: Option<f64>,
    pub source: RecommendationSource,
}

impl From<Recommendation> for RecommendedMovie {
    fn from(recommendation: Recommendation) -> Self {
        let Recommendation {
            movie,
            predicted_rating,
            source,
        } = recommendation;

        Self {
            movie_id: movie.movie_id,
            title: movie.title,
            rank: movie.rank,
            review_count: movie.review_count,
            predicted_rating,
            source,
        }
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Movies offered to the user for rating, most popular first
pub async fn list_movies(
    State(state): State<AppState>,
    Query(query): Query<MoviesQuery>,
) -> Json<Vec<Movie>> {
    let limit = query.limit.unwrap_or(state.display_count);
    Json(display_candidates(&state.catalog, limit).to_vec())
}

/// Recommendations for a set of ratings
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> AppResult<Json<Vec<RecommendedMovie>>> {
    // Non-integer ratings fail here, before the catalog is consulted
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(request_id = %request_id, error = %rejection, "Malformed request body");
        AppError::InvalidInput(rejection.body_text())
    })?;

    tracing::info!(
        request_id = %request_id,
        rated_count = request.ratings.len(),
        "Processing recommendation request"
    );

    let ratings = build_rating_vector(&state.catalog, &request.ratings).inspect_err(|e| {
        tracing::warn!(request_id = %request_id, error = %e, "Rejected ratings");
    })?;

    let recommendations: Vec<RecommendedMovie> = Recommender::new(&state.catalog, state.settings)
        .recommend(&ratings)
        .into_iter()
        .map(RecommendedMovie::from)
        .collect();

    tracing::info!(
        request_id = %request_id,
        recommendation_count = recommendations.len(),
        "Recommendations completed"
    );

    Ok(Json(recommendations))
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::catalog::ArtifactError;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Unknown movie id: {0}")]
    InvalidItemId(String),

    #[error("Invalid rating {rating} for movie {movie_id}: must be between {min} and {max}")]
    InvalidRatingValue {
        movie_id: String,
        rating: i64,
        min: u8,
        max: u8,
    },

    #[error("Startup artifact error: {0}")]
    StartupArtifact(#[from] ArtifactError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidItemId(_)
            | AppError::InvalidRatingValue { .. }
            | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::StartupArtifact(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_rating_message() {
        let err = AppError::InvalidRatingValue {
            movie_id: "m1".to_string(),
            rating: 7,
            min: 1,
            max: 5,
        };
        assert_eq!(
            err.to_string(),
            "Invalid rating 7 for movie m1: must be between 1 and 5"
        );
    }

    #[test]
    fn test_status_codes() {
        let bad_id = AppError::InvalidItemId("m0".to_string()).into_response();
        assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);

        let malformed = AppError::InvalidInput("bad body".to_string()).into_response();
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

        let artifact = AppError::from(ArtifactError::Empty("popularity ranking")).into_response();
        assert_eq!(artifact.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

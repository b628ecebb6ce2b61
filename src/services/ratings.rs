use std::collections::BTreeMap;

use crate::{
    catalog::Catalog,
    error::{AppError, AppResult},
    models::{RatingVector, MAX_RATING, MIN_RATING},
};

/// Lays a sparse rating map over the full item universe
///
/// The whole request is rejected on the first unknown id or out-of-range value;
/// keys are checked in sorted order so the reported error does not depend on
/// how the caller ordered its map.
pub fn build_rating_vector(
    catalog: &Catalog,
    ratings: &BTreeMap<String, i64>,
) -> AppResult<RatingVector> {
    let mut vector = RatingVector::unrated(catalog.len());

    for (movie_id, &rating) in ratings {
        let index = catalog
            .index_of(movie_id)
            .ok_or_else(|| AppError::InvalidItemId(movie_id.clone()))?;

        let value = u8::try_from(rating)
            .ok()
            .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
            .ok_or_else(|| AppError::InvalidRatingValue {
                movie_id: movie_id.clone(),
                rating,
                min: MIN_RATING,
                max: MAX_RATING,
            })?;

        vector.set(index, value);
    }

    Ok(vector)
}

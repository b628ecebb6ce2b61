use crate::{catalog::SimilarityStore, models::RatingVector};

/// Predicted score for one unrated item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Catalog position of the item
    pub index: usize,
    /// Similarity-weighted average rating, `None` when there is no usable evidence
    pub score: Option<f64>,
}

/// Item-based collaborative filtering over a precomputed similarity table
pub struct Predictor<'a> {
    similarity: &'a SimilarityStore,
}

impl<'a> Predictor<'a> {
    pub fn new(similarity: &'a SimilarityStore) -> Self {
        Self { similarity }
    }

    /// Scores every unrated item, in catalog order
    pub fn predict(&self, ratings: &RatingVector) -> Vec<Prediction> {
        let predictions: Vec<Prediction> = ratings
            .unrated_indices()
            .map(|index| Prediction {
                index,
                score: self.predict_item(index, ratings),
            })
            .collect();

        tracing::debug!(
            unrated = predictions.len(),
            scored = predictions.iter().filter(|p| p.score.is_some()).count(),
            "Computed predictions"
        );

        predictions
    }

    /// Weighted average of the user's ratings on the item's rated neighbors
    ///
    /// Undefined when no neighbor is rated or the weights cancel out to zero.
    pub fn predict_item(&self, index: usize, ratings: &RatingVector) -> Option<f64> {
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        let mut evidence = 0usize;

        for &(neighbor, similarity) in self.similarity.neighbors(index) {
            if let Some(rating) = ratings.get(neighbor) {
                weighted_sum += similarity * f64::from(rating);
                weight_total += similarity;
                evidence += 1;
            }
        }

        if evidence == 0 || weight_total == 0.0 {
            return None;
        }

        Some(weighted_sum / weight_total)
    }
}

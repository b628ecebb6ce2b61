pub mod prediction;
pub mod ratings;
pub mod recommendations;

pub use prediction::{Prediction, Predictor};
pub use ratings::build_rating_vector;
pub use recommendations::{
    display_candidates, FallbackPolicy, Recommendation, RecommendationSettings,
    RecommendationSource, Recommender,
};

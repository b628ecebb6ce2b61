pub mod movie;
pub mod ratings;

pub use movie::{Movie, MovieId};
pub use ratings::{RatingVector, MAX_RATING, MIN_RATING};

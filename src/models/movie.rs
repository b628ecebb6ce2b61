use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt::Display};

/// Stable catalog key for a movie (e.g. "m1193")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(String);

impl MovieId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for MovieId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MovieId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A catalog movie with the metadata returned to callers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub movie_id: MovieId,
    pub title: String,
    /// 1-based position in the popularity ranking
    pub rank: usize,
    /// Number of reviews at or above the quality threshold, when the ranking job exported it
    pub review_count: Option<u32>,
}

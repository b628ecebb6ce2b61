//! Precomputed artifacts the recommender reads from.
//!
//! Both tables are produced by offline batch jobs, loaded once at startup and
//! never written again. A [`Catalog`] ties them together over one item universe
//! and is shared read-only by every request.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::{Movie, MovieId};

pub mod popularity;
pub mod similarity;

pub use popularity::PopularityRanking;
pub use similarity::SimilarityStore;

/// Failures while loading or validating the startup artifacts
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed artifact: {0}")]
    Malformed(String),

    #[error("Empty {0}")]
    Empty(&'static str),

    #[error("Duplicate movie id: {0}")]
    DuplicateItem(MovieId),

    #[error("Movie {0} is not part of the similarity matrix")]
    UnknownItem(MovieId),

    #[error("Movie {0} has no entry in the popularity ranking")]
    MissingMetadata(MovieId),
}

/// The item universe with its similarity table and popularity ranking
#[derive(Debug, Clone)]
pub struct Catalog {
    similarity: SimilarityStore,
    popularity: PopularityRanking,
    /// Catalog positions in popularity order
    popularity_order: Vec<usize>,
    /// Catalog position -> position in the popularity ranking
    metadata: Vec<usize>,
}

impl Catalog {
    /// Combines the two artifacts, requiring they cover exactly the same movies
    pub fn new(
        similarity: SimilarityStore,
        popularity: PopularityRanking,
    ) -> Result<Self, ArtifactError> {
        let mut metadata = vec![None; similarity.len()];
        let mut popularity_order = Vec::with_capacity(popularity.len());

        for (position, movie) in popularity.movies().iter().enumerate() {
            let index = similarity
                .index_of(movie.movie_id.as_str())
                .ok_or_else(|| ArtifactError::UnknownItem(movie.movie_id.clone()))?;
            metadata[index] = Some(position);
            popularity_order.push(index);
        }

        let metadata = metadata
            .into_iter()
            .enumerate()
            .map(|(index, position)| {
                position.ok_or_else(|| {
                    ArtifactError::MissingMetadata(similarity.items()[index].clone())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            similarity,
            popularity,
            popularity_order,
            metadata,
        })
    }

    /// Loads both artifacts from disk
    pub fn load(
        movies_path: impl AsRef<Path>,
        similarity_path: impl AsRef<Path>,
    ) -> Result<Self, ArtifactError> {
        let popularity = PopularityRanking::from_path(movies_path)?;
        let similarity = SimilarityStore::from_path(similarity_path)?;
        Self::new(similarity, popularity)
    }

    /// Size of the item universe
    pub fn len(&self) -> usize {
        self.similarity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.similarity.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.similarity.index_of(id)
    }

    /// Metadata for the movie at a catalog position
    pub fn movie(&self, index: usize) -> &Movie {
        &self.popularity.movies()[self.metadata[index]]
    }

    pub fn similarity(&self) -> &SimilarityStore {
        &self.similarity
    }

    pub fn popularity(&self) -> &PopularityRanking {
        &self.popularity
    }

    pub fn popularity_order(&self) -> &[usize] {
        &self.popularity_order
    }
}

use std::{collections::HashSet, fs::File, io::Read, path::Path};

use serde::{de, Deserialize, Deserializer};

use super::ArtifactError;
use crate::models::{Movie, MovieId};

/// One row of the popularity export produced by the offline ranking job
#[derive(Debug, Deserialize)]
struct MovieRecord {
    movie_id: String,
    title: String,
    #[serde(default, deserialize_with = "whole_count")]
    review_count: Option<u32>,
}

/// Accepts `2853` as well as `2853.0`, which pandas writes for integer columns with gaps
fn whole_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if value.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&value) {
        return Err(de::Error::custom(format!(
            "review_count must be a non-negative whole number, got {}",
            value
        )));
    }

    Ok(Some(value as u32))
}

/// Movies ordered from most to least popular, with their display metadata
#[derive(Debug, Clone)]
pub struct PopularityRanking {
    movies: Vec<Movie>,
}

impl PopularityRanking {
    pub fn new(movies: Vec<Movie>) -> Result<Self, ArtifactError> {
        if movies.is_empty() {
            return Err(ArtifactError::Empty("popularity ranking"));
        }

        let mut seen = HashSet::with_capacity(movies.len());
        for movie in &movies {
            if !seen.insert(&movie.movie_id) {
                return Err(ArtifactError::DuplicateItem(movie.movie_id.clone()));
            }
        }

        Ok(Self { movies })
    }

    /// Parses a CSV export with `movie_id`, `title` and optional `review_count` columns
    ///
    /// Row order is the ranking; extra columns are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ArtifactError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut movies = Vec::new();
        for (position, record) in csv_reader.deserialize::<MovieRecord>().enumerate() {
            let record = record?;
            movies.push(Movie {
                movie_id: MovieId::new(record.movie_id),
                title: record.title,
                rank: position + 1,
                review_count: record.review_count,
            });
        }

        Self::new(movies)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// The `limit` most popular movies
    pub fn top(&self, limit: usize) -> &[Movie] {
        &self.movies[..limit.min(self.movies.len())]
    }
}

/// Lowest rating a user can give
pub const MIN_RATING: u8 = 1;
/// Highest rating a user can give
pub const MAX_RATING: u8 = 5;

/// A user's ratings laid over the whole item universe, indexed by catalog position
///
/// Built fresh for every request and dropped with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingVector {
    ratings: Vec<Option<u8>>,
}

impl RatingVector {
    /// Creates a vector with every item unrated
    pub fn unrated(universe_len: usize) -> Self {
        Self {
            ratings: vec![None; universe_len],
        }
    }

    pub(crate) fn set(&mut self, index: usize, rating: u8) {
        self.ratings[index] = Some(rating);
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.ratings.get(index).copied().flatten()
    }

    pub fn is_rated(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn rated_count(&self) -> usize {
        self.ratings.iter().filter(|r| r.is_some()).count()
    }

    /// Catalog positions of unrated items, in catalog order
    pub fn unrated_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.ratings
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_none())
            .map(|(i, _)| i)
    }
}

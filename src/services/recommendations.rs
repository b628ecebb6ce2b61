use std::{cmp::Ordering, collections::HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    catalog::Catalog,
    models::{Movie, RatingVector},
    services::prediction::{Prediction, Predictor},
};

/// Decides when the popularity ranking is used to fill the result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Rank every unrated item, scored or not, and backfill only when fewer
    /// than K items are left unrated. Unscored items keep catalog order.
    #[default]
    UnratedShortfall,
    /// Rank only items with a defined prediction and backfill from the
    /// popularity ranking whenever fewer than K of them exist.
    UndefinedShortfall,
}

/// Knobs for the result assembler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationSettings {
    /// Maximum number of recommendations (K)
    pub recommendation_count: usize,
    pub fallback_policy: FallbackPolicy,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            recommendation_count: 10,
            fallback_policy: FallbackPolicy::default(),
        }
    }
}

/// Why a movie occupies its slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    /// Ranked by a defined prediction
    Similarity,
    /// Ranked among unrated items without a defined prediction
    Unscored,
    /// Backfilled from the popularity ranking
    Popularity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub movie: Movie,
    pub predicted_rating: Option<f64>,
    pub source: RecommendationSource,
}

/// Ranks predictions and backfills from the popularity ranking
pub struct Recommender<'a> {
    catalog: &'a Catalog,
    settings: RecommendationSettings,
}

impl<'a> Recommender<'a> {
    pub fn new(catalog: &'a Catalog, settings: RecommendationSettings) -> Self {
        Self { catalog, settings }
    }

    /// Produces up to K distinct unrated movies, best first
    pub fn recommend(&self, ratings: &RatingVector) -> Vec<Recommendation> {
        let k = self.settings.recommendation_count;

        let mut ranked = Predictor::new(self.catalog.similarity()).predict(ratings);
        // sort_by is stable, so ties keep catalog order
        ranked.sort_by(compare_predictions);

        let primary: Vec<Prediction> = match self.settings.fallback_policy {
            FallbackPolicy::UnratedShortfall => ranked.into_iter().take(k).collect(),
            FallbackPolicy::UndefinedShortfall => ranked
                .into_iter()
                .filter(|p| p.score.is_some())
                .take(k)
                .collect(),
        };

        let mut recommendations: Vec<Recommendation> = primary
            .iter()
            .map(|p| Recommendation {
                movie: self.catalog.movie(p.index).clone(),
                predicted_rating: p.score,
                source: if p.score.is_some() {
                    RecommendationSource::Similarity
                } else {
                    RecommendationSource::Unscored
                },
            })
            .collect();

        if recommendations.len() < k {
            let taken: HashSet<usize> = primary.iter().map(|p| p.index).collect();
            let backfill = self
                .catalog
                .popularity_order()
                .iter()
                .copied()
                .filter(|&index| !ratings.is_rated(index) && !taken.contains(&index))
                .take(k - recommendations.len());

            for index in backfill {
                recommendations.push(Recommendation {
                    movie: self.catalog.movie(index).clone(),
                    predicted_rating: None,
                    source: RecommendationSource::Popularity,
                });
            }
        }

        tracing::debug!(
            rated = ratings.rated_count(),
            returned = recommendations.len(),
            backfilled = recommendations
                .iter()
                .filter(|r| r.source == RecommendationSource::Popularity)
                .count(),
            policy = ?self.settings.fallback_policy,
            "Assembled recommendations"
        );

        recommendations
    }
}

/// Descending by score with undefined scores after every defined one
fn compare_predictions(a: &Prediction, b: &Prediction) -> Ordering {
    match (a.score, b.score) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Movies offered to the user for rating, most popular first
pub fn display_candidates(catalog: &Catalog, limit: usize) -> &[Movie] {
    catalog.popularity().top(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PopularityRanking, SimilarityStore};
    use crate::models::MovieId;

    /// Universe in `catalog_order`, popularity in `popularity_order`, sparse similarities by id
    fn catalog(
        catalog_order: &[&str],
        popularity_order: &[&str],
        cells: &[(&str, &str, f64)],
    ) -> Catalog {
        let n = catalog_order.len();
        let position = |id: &str| catalog_order.iter().position(|c| *c == id).unwrap();

        let mut table = vec![vec![None; n]; n];
        for &(from, to, s) in cells {
            table[position(from)][position(to)] = Some(s);
        }
        let similarity = SimilarityStore::from_rows(
            catalog_order.iter().copied().map(MovieId::from).collect(),
            table,
        )
        .unwrap();

        let popularity = PopularityRanking::new(
            popularity_order
                .iter()
                .enumerate()
                .map(|(i, id)| Movie {
                    movie_id: MovieId::from(*id),
                    title: format!("Title {}", id),
                    rank: i + 1,
                    review_count: Some((100 - i) as u32),
                })
                .collect(),
        )
        .unwrap();

        Catalog::new(similarity, popularity).unwrap()
    }

    fn ratings(catalog: &Catalog, pairs: &[(&str, u8)]) -> RatingVector {
        let mut w = RatingVector::unrated(catalog.len());
        for &(id, r) in pairs {
            w.set(catalog.index_of(id).unwrap(), r);
        }
        w
    }

    fn settings(k: usize, fallback_policy: FallbackPolicy) -> RecommendationSettings {
        RecommendationSettings {
            recommendation_count: k,
            fallback_policy,
        }
    }

    fn ids(recommendations: &[Recommendation]) -> Vec<&str> {
        recommendations
            .iter()
            .map(|r| r.movie.movie_id.as_str())
            .collect()
    }

    const ABCDE: [&str; 5] = ["A", "B", "C", "D", "E"];

    #[test]
    fn test_single_rated_neighbor_scenario() {
        let catalog = catalog(&ABCDE, &["E", "D", "A", "C", "B"], &[("B", "A", 0.8)]);
        let w = ratings(&catalog, &[("A", 5)]);

        let literal = Recommender::new(&catalog, settings(4, FallbackPolicy::UnratedShortfall))
            .recommend(&w);
        assert_eq!(ids(&literal), vec!["B", "C", "D", "E"]);
        assert_eq!(literal[0].predicted_rating, Some(5.0));
        assert_eq!(literal[0].source, RecommendationSource::Similarity);
        assert!(literal[1..]
            .iter()
            .all(|r| r.source == RecommendationSource::Unscored && r.predicted_rating.is_none()));

        let backfilled =
            Recommender::new(&catalog, settings(4, FallbackPolicy::UndefinedShortfall))
                .recommend(&w);
        assert_eq!(ids(&backfilled), vec!["B", "E", "D", "C"]);
        assert!(backfilled[1..]
            .iter()
            .all(|r| r.source == RecommendationSource::Popularity));
    }

    #[test]
    fn test_policies_agree_when_catalog_and_popularity_orders_match() {
        let catalog = catalog(&ABCDE, &ABCDE, &[("B", "A", 0.8)]);
        let w = ratings(&catalog, &[("A", 5)]);

        for policy in [FallbackPolicy::UnratedShortfall, FallbackPolicy::UndefinedShortfall] {
            let result = Recommender::new(&catalog, settings(4, policy)).recommend(&w);
            assert_eq!(ids(&result), vec!["B", "C", "D", "E"], "{:?}", policy);
        }
    }

    #[test]
    fn test_empty_ratings_return_top_of_popularity_ranking() {
        let catalog = catalog(&ABCDE, &ABCDE, &[("B", "A", 0.8), ("C", "D", 0.4)]);
        let w = RatingVector::unrated(catalog.len());

        for policy in [FallbackPolicy::UnratedShortfall, FallbackPolicy::UndefinedShortfall] {
            let result = Recommender::new(&catalog, settings(3, policy)).recommend(&w);
            let expected: Vec<&str> = catalog
                .popularity()
                .top(3)
                .iter()
                .map(|m| m.movie_id.as_str())
                .collect();
            assert_eq!(ids(&result), expected);
        }
    }

    #[test]
    fn test_empty_ratings_backfill_uses_popularity_order() {
        let catalog = catalog(&ABCDE, &["C", "A", "E", "B", "D"], &[]);
        let w = RatingVector::unrated(catalog.len());

        let result = Recommender::new(&catalog, settings(3, FallbackPolicy::UndefinedShortfall))
            .recommend(&w);
        assert_eq!(ids(&result), vec!["C", "A", "E"]);
    }

    #[test]
    fn test_fully_rated_universe_yields_nothing() {
        let catalog = catalog(&ABCDE, &ABCDE, &[("B", "A", 0.8)]);
        let w = ratings(&catalog, &[("A", 1), ("B", 2), ("C", 3), ("D", 4), ("E", 5)]);

        for policy in [FallbackPolicy::UnratedShortfall, FallbackPolicy::UndefinedShortfall] {
            assert!(Recommender::new(&catalog, settings(4, policy)).recommend(&w).is_empty());
        }
    }

    #[test]
    fn test_backfill_when_fewer_unrated_than_k() {
        let catalog = catalog(&ABCDE, &["E", "D", "C", "B", "A"], &[("C", "A", 0.5)]);
        let w = ratings(&catalog, &[("A", 4), ("B", 2)]);

        let result = Recommender::new(&catalog, settings(10, FallbackPolicy::UnratedShortfall))
            .recommend(&w);
        // all three unrated items fit in the primary segment
        assert_eq!(ids(&result), vec!["C", "D", "E"]);
        assert!(result.iter().all(|r| r.source != RecommendationSource::Popularity));

        let result = Recommender::new(&catalog, settings(10, FallbackPolicy::UndefinedShortfall))
            .recommend(&w);
        assert_eq!(ids(&result), vec!["C", "E", "D"]);
    }

    #[test]
    fn test_defined_scores_sorted_descending_and_ties_keep_catalog_order() {
        let catalog = catalog(
            &ABCDE,
            &ABCDE,
            &[
                ("B", "A", 1.0), // 2.0
                ("C", "E", 1.0), // 5.0
                ("D", "A", 0.3), // 2.0, tie with B
            ],
        );
        let w = ratings(&catalog, &[("A", 2), ("E", 5)]);

        let result = Recommender::new(&catalog, settings(3, FallbackPolicy::UnratedShortfall))
            .recommend(&w);
        assert_eq!(ids(&result), vec!["C", "B", "D"]);
        let scores: Vec<f64> = result.iter().filter_map(|r| r.predicted_rating).collect();
        assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn test_negative_scores_still_rank_above_undefined() {
        // a mix of positive and negative weights can push a prediction out of the rating range
        let catalog = catalog(
            &ABCDE,
            &["E", "D", "C", "B", "A"],
            &[("B", "A", 2.0), ("B", "C", -1.5)],
        );
        let w = ratings(&catalog, &[("A", 1), ("C", 5)]);

        let result = Recommender::new(&catalog, settings(2, FallbackPolicy::UnratedShortfall))
            .recommend(&w);
        assert_eq!(result[0].movie.movie_id.as_str(), "B");
        let score = result[0].predicted_rating.unwrap();
        assert!((score - (2.0 * 1.0 - 1.5 * 5.0) / 0.5).abs() < 1e-9);
        assert_eq!(result[1].movie.movie_id.as_str(), "D");
    }

    #[test]
    fn test_result_length_and_exclusions_hold_for_every_rating_subset() {
        let cells = [
            ("A", "B", 0.9),
            ("B", "A", 0.9),
            ("C", "A", 0.2),
            ("D", "E", -0.4),
            ("E", "D", 0.7),
            ("E", "C", 0.1),
        ];
        let catalog = catalog(&ABCDE, &["D", "B", "E", "A", "C"], &cells);

        for k in 1..=6 {
            for policy in [FallbackPolicy::UnratedShortfall, FallbackPolicy::UndefinedShortfall] {
                for mask in 0u32..(1 << ABCDE.len()) {
                    let rated: Vec<(&str, u8)> = ABCDE
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| mask & (1 << i) != 0)
                        .map(|(i, id)| (*id, (i % 5) as u8 + 1))
                        .collect();
                    let w = ratings(&catalog, &rated);
                    let recommender = Recommender::new(&catalog, settings(k, policy));
                    let result = recommender.recommend(&w);

                    let expected_len = k.min(ABCDE.len() - rated.len());
                    assert_eq!(result.len(), expected_len);

                    let unique: HashSet<&str> = ids(&result).into_iter().collect();
                    assert_eq!(unique.len(), result.len());
                    assert!(rated.iter().all(|(id, _)| !unique.contains(id)));

                    // deterministic
                    assert_eq!(recommender.recommend(&w), result);
                }
            }
        }
    }

    #[test]
    fn test_display_candidates_follow_popularity() {
        let catalog = catalog(&ABCDE, &["C", "A", "E", "B", "D"], &[]);

        let shown: Vec<&str> = display_candidates(&catalog, 2)
            .iter()
            .map(|m| m.movie_id.as_str())
            .collect();
        assert_eq!(shown, vec!["C", "A"]);
        assert_eq!(display_candidates(&catalog, 100).len(), 5);
    }

    #[test]
    fn test_policy_serde_names() {
        assert_eq!(
            serde_json::to_string(&FallbackPolicy::UnratedShortfall).unwrap(),
            "\"unrated_shortfall\""
        );
        let policy: FallbackPolicy = serde_json::from_str("\"undefined_shortfall\"").unwrap();
        assert_eq!(policy, FallbackPolicy::UndefinedShortfall);
    }
}

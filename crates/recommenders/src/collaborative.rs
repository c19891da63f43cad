//! Collaborative Recommender - item-item neighborhood over ratings
//!
//! "People who rated your picks the same way also rated these"
//!
//! ## Algorithm
//! 1. Validate the request and drop repeated seeds
//! 2. Seeds nobody rated are cold and contribute nothing; if every seed is
//!    cold the query fails with `InsufficientData`
//! 3. For each warm seed, compare its rating column with every other movie's
//!    column over the users who rated both (adjusted cosine by default)
//! 4. Sum per candidate, then push low-confidence candidates down
//! 5. Remove the seeds, sort by score (ties by ascending id), keep top N
//!
//! ## Learning Goals
//! - Sparse column vectors instead of a dense users × movies matrix
//! - Rayon par_iter over candidate movies

use crate::error::{RecommendError, Result};
use crate::neighbors::NeighborIndex;
use crate::ranking::{accumulate, check_request, rank_scores, ScoredMovie};
use crate::rating_matrix::RatingMatrix;
use crate::similarity::{CoRatedCosine, SimilarityMeasure, SparseVector};
use crate::traits::Recommender;
use data_loader::{Catalog, MovieId};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Smallest accepted low-confidence weight
const MIN_CONFIDENCE_WEIGHT: f32 = 1e-3;

/// Item-item collaborative recommender
#[derive(Clone)]
pub struct CollaborativeRecommender {
    catalog: Arc<Catalog>,
    matrix: Arc<RatingMatrix>,

    /// Columns as compared: mean-centered or raw, per `mean_center`
    columns: Arc<HashMap<MovieId, SparseVector>>,
    mean_center: bool,

    /// Multiplier (or divisor, for negative scores) on low-confidence candidates
    low_confidence_weight: f32,

    neighbors: Option<Arc<NeighborIndex>>,
}

impl CollaborativeRecommender {
    /// Create a recommender using adjusted cosine and query-time scoring
    pub fn new(catalog: Arc<Catalog>, matrix: Arc<RatingMatrix>) -> Self {
        let columns = Arc::new(matrix.comparison_columns(true));
        Self {
            catalog,
            matrix,
            columns,
            mean_center: true,
            low_confidence_weight: 0.5,
            neighbors: None,
        }
    }

    /// Compare mean-centered columns (default: true)
    ///
    /// Changing this discards any neighbor index built so far.
    pub fn with_mean_centering(mut self, enabled: bool) -> Self {
        if enabled != self.mean_center {
            self.mean_center = enabled;
            self.columns = Arc::new(self.matrix.comparison_columns(enabled));
            self.neighbors = None;
        }
        self
    }

    /// Configure the low-confidence weight (default: 0.5)
    ///
    /// Clamped into `(0, 1]`; 1.0 disables down-weighting.
    pub fn with_low_confidence_weight(mut self, weight: f32) -> Self {
        self.low_confidence_weight = if weight.is_nan() {
            1.0
        } else {
            weight.clamp(MIN_CONFIDENCE_WEIGHT, 1.0)
        };
        self
    }

    /// Use an existing neighbor index
    pub fn with_neighbor_index(mut self, index: Arc<NeighborIndex>) -> Self {
        self.neighbors = Some(index);
        self
    }

    /// Precompute neighbor lists for the whole catalog
    pub fn with_precomputed_neighbors(self, limit: Option<usize>) -> Result<Self> {
        let index = NeighborIndex::build(
            &self.catalog.all_ids(),
            &self.columns,
            &CoRatedCosine,
            limit,
        )?;
        Ok(self.with_neighbor_index(Arc::new(index)))
    }

    /// Rating similarity of two movies over their co-raters
    pub fn similarity(&self, a: MovieId, b: MovieId) -> f32 {
        match (self.columns.get(&a), self.columns.get(&b)) {
            (Some(va), Some(vb)) => CoRatedCosine.similarity(va, vb),
            _ => 0.0,
        }
    }

    pub fn matrix(&self) -> &RatingMatrix {
        &self.matrix
    }

    pub fn neighbor_index(&self) -> Option<&NeighborIndex> {
        self.neighbors.as_deref()
    }

    /// Apply the low-confidence penalty; always moves a score down
    fn adjust(&self, movie_id: MovieId, score: f32) -> f32 {
        if !self.matrix.is_low_confidence(movie_id) {
            return score;
        }
        if score >= 0.0 {
            score * self.low_confidence_weight
        } else {
            score / self.low_confidence_weight
        }
    }

    fn seed_contributions(&self, seed: MovieId) -> Vec<(MovieId, f32)> {
        if let Some(list) = self.neighbors.as_ref().and_then(|index| index.neighbors(seed)) {
            return list.iter().map(|n| (n.movie_id, n.score)).collect();
        }

        let ids = self.catalog.all_ids();
        ids.par_iter()
            .filter(|&&id| id != seed)
            .map(|&id| (id, self.similarity(seed, id)))
            .collect()
    }
}

impl Recommender for CollaborativeRecommender {
    fn name(&self) -> &str {
        "collaborative"
    }

    #[instrument(skip(self), fields(strategy = "collaborative"))]
    fn recommend(&self, seeds: &[MovieId], top_n: usize) -> Result<Vec<ScoredMovie>> {
        let seeds = check_request(&self.catalog, seeds, top_n)?;

        let (warm, cold): (Vec<MovieId>, Vec<MovieId>) = seeds
            .iter()
            .copied()
            .partition(|&seed| self.matrix.rating_count(seed) > 0);
        if warm.is_empty() {
            warn!(seeds = seeds.len(), "No seed movie has any ratings");
            return Err(RecommendError::InsufficientData { seeds: seeds.len() });
        }
        if !cold.is_empty() {
            debug!(cold = ?cold, "Unrated seeds contribute nothing");
        }

        let mut totals: HashMap<MovieId, f32> = HashMap::new();
        for &seed in &warm {
            accumulate(&mut totals, self.seed_contributions(seed));
        }
        for (&movie_id, score) in totals.iter_mut() {
            *score = self.adjust(movie_id, *score);
        }
        debug!(candidates = totals.len(), "Scored collaborative candidates");

        Ok(rank_scores(totals, &seeds, top_n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating_matrix::RatingMatrixConfig;
    use data_loader::{Genre, Movie, Rating, UserId};

    fn create_test_catalog(count: MovieId) -> Catalog {
        let mut catalog = Catalog::new();
        for id in 1..=count {
            catalog
                .insert_movie(Movie {
                    id,
                    title: format!("Movie {}", id),
                    year: None,
                    genres: vec![Genre::Drama],
                    tokens: Vec::new(),
                })
                .unwrap();
        }
        catalog
    }

    fn rating(user_id: UserId, movie_id: MovieId, value: f32) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating: value,
            timestamp: 0,
        }
    }

    /// Users 1-3 love movies 1 and 2, users 4-6 love movies 3 and 4.
    /// Movie 5 has a single rating, movie 6 has none.
    fn create_test_ratings() -> Vec<Rating> {
        let mut ratings = Vec::new();
        for user in 1..=3 {
            ratings.extend([
                rating(user, 1, 5.0),
                rating(user, 2, 4.5),
                rating(user, 3, 1.0),
                rating(user, 4, 1.5),
            ]);
        }
        for user in 4..=6 {
            ratings.extend([
                rating(user, 1, 1.0),
                rating(user, 2, 1.5),
                rating(user, 3, 5.0),
                rating(user, 4, 4.5),
            ]);
        }
        ratings.push(rating(1, 5, 5.0));
        ratings
    }

    fn create_recommender() -> CollaborativeRecommender {
        let catalog = Arc::new(create_test_catalog(6));
        let matrix = Arc::new(RatingMatrix::build(
            &create_test_ratings(),
            &catalog,
            RatingMatrixConfig::default(),
        ));
        CollaborativeRecommender::new(catalog, matrix)
    }

    fn ids(ranked: &[ScoredMovie]) -> Vec<MovieId> {
        ranked.iter().map(|s| s.movie_id).collect()
    }

    #[test]
    fn test_similar_taste_ranks_first() {
        let recommender = create_recommender();

        assert_eq!(recommender.recommend(&[1], 1).unwrap()[0].movie_id, 2);
        assert_eq!(recommender.recommend(&[3], 1).unwrap()[0].movie_id, 4);
        assert!(recommender.similarity(1, 2) > 0.9);
        assert!(recommender.similarity(1, 3) < 0.0);
    }

    #[test]
    fn test_all_cold_seeds_is_insufficient_data() {
        let recommender = create_recommender();
        let mut catalog = create_test_catalog(6);
        catalog
            .insert_movie(Movie {
                id: 7,
                title: "Movie 7".to_string(),
                year: None,
                genres: Vec::new(),
                tokens: Vec::new(),
            })
            .unwrap();

        assert_eq!(
            recommender.recommend(&[6], 10),
            Err(RecommendError::InsufficientData { seeds: 1 })
        );

        let catalog = Arc::new(catalog);
        let matrix = Arc::new(RatingMatrix::build(
            &create_test_ratings(),
            &catalog,
            RatingMatrixConfig::default(),
        ));
        let recommender = CollaborativeRecommender::new(catalog, matrix);
        assert_eq!(
            recommender.recommend(&[6, 7], 10),
            Err(RecommendError::InsufficientData { seeds: 2 })
        );
    }

    #[test]
    fn test_cold_seed_contributes_nothing() {
        let recommender = create_recommender();
        assert_eq!(
            recommender.recommend(&[1, 6], 10).unwrap(),
            // Same scores as seeding with movie 1 alone, minus movie 6 itself
            recommender
                .recommend(&[1], 10)
                .unwrap()
                .into_iter()
                .filter(|s| s.movie_id != 6)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_low_confidence_is_pushed_down() {
        let recommender = create_recommender();
        assert!(recommender.matrix().is_low_confidence(5));

        let penalized = recommender.clone().with_low_confidence_weight(0.5);
        let neutral = recommender.clone().with_low_confidence_weight(1.0);
        let score_of = |r: &CollaborativeRecommender| {
            r.recommend(&[2], 10)
                .unwrap()
                .into_iter()
                .find(|s| s.movie_id == 5)
                .map(|s| s.score)
        };

        // Movie 5 is a candidate either way but scores lower when penalized
        let (p, n) = (score_of(&penalized).unwrap(), score_of(&neutral).unwrap());
        assert!(p < n);
        assert_eq!(p, n * 0.5);
        assert_eq!(penalized.adjust(5, 0.8), 0.4);
        assert_eq!(penalized.adjust(5, -0.4), -0.8);
        assert_eq!(penalized.adjust(1, 0.8), 0.8);
    }

    #[test]
    fn test_low_confidence_candidate_drops_below_confident_one() {
        let recommender = create_recommender();

        // Movie 5's single co-rater agrees perfectly with movie 2, so it edges
        // out the well-rated movie 1 until the penalty applies
        let neutral = recommender.clone().with_low_confidence_weight(1.0);
        assert_eq!(ids(&neutral.recommend(&[2], 2).unwrap()), vec![5, 1]);

        let penalized = recommender.with_low_confidence_weight(0.5);
        assert_eq!(ids(&penalized.recommend(&[2], 2).unwrap()), vec![1, 5]);
    }

    #[test]
    fn test_raw_and_centered_columns_differ() {
        let centered = create_recommender();
        let raw = centered.clone().with_mean_centering(false);

        // Raw ratings are all positive, so even opposite tastes look similar
        assert!(raw.similarity(1, 3) > 0.0);
        assert!(centered.similarity(1, 3) < 0.0);
    }

    #[test]
    fn test_full_index_matches_query_time_scoring() {
        let exhaustive = create_recommender();
        let indexed = exhaustive.clone().with_precomputed_neighbors(None).unwrap();

        for seeds in [vec![1], vec![1, 3], vec![2, 5, 6]] {
            assert_eq!(
                exhaustive.recommend(&seeds, 10).unwrap(),
                indexed.recommend(&seeds, 10).unwrap()
            );
        }
    }

    #[test]
    fn test_zero_neighbor_limit_is_rejected() {
        let result = create_recommender().with_precomputed_neighbors(Some(0));
        assert!(matches!(result, Err(RecommendError::InvalidRequest(_))));
    }

    #[test]
    fn test_results_exclude_seeds() {
        let recommender = create_recommender();
        let ranked = recommender.recommend(&[1, 2, 3], 10).unwrap();
        let ids = ids(&ranked);

        assert_eq!(ids.len(), 3);
        assert!(ids.iter().all(|id| ![1, 2, 3].contains(id)));
    }
}

//! Rating Matrix for the collaborative path.
//!
//! A sparse users × movies matrix built once from rating observations. It is
//! stored twice, by row (one vector per user, indexed by movie id) and by
//! column (one vector per movie, indexed by user id), so both access patterns
//! are a single lookup.
//!
//! An absent cell means "not rated". It is never filled with zero.

use crate::similarity::SparseVector;
use data_loader::{Catalog, MovieId, Rating, UserId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument, warn};

/// Settings for [`RatingMatrix::build`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingMatrixConfig {
    /// Movies with fewer ratings than this are low-confidence
    pub min_ratings: usize,
    pub rating_min: f32,
    pub rating_max: f32,
}

impl Default for RatingMatrixConfig {
    fn default() -> Self {
        Self {
            min_ratings: 3,
            rating_min: 0.5,
            rating_max: 5.0,
        }
    }
}

/// Per-movie aggregates computed while building the matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovieStats {
    pub avg_rating: f32,
    pub rating_count: usize,
    /// avg_rating × ln(rating_count + 1)
    pub popularity_score: f32,
}

impl MovieStats {
    fn from_values(values: &[f32]) -> Self {
        let rating_count = values.len();
        let avg_rating = if rating_count == 0 {
            0.0
        } else {
            (values.iter().map(|&v| v as f64).sum::<f64>() / rating_count as f64) as f32
        };
        Self {
            avg_rating,
            rating_count,
            popularity_score: avg_rating * ((rating_count + 1) as f32).ln(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RatingMatrix {
    rows: HashMap<UserId, SparseVector>,
    columns: HashMap<MovieId, SparseVector>,
    user_means: HashMap<UserId, f32>,
    stats: HashMap<MovieId, MovieStats>,
    observations: usize,
    min_ratings: usize,
}

impl RatingMatrix {
    /// Build the matrix from raw observations
    ///
    /// ## Rules
    /// - Ratings for movies not in the catalog are dropped
    /// - Ratings outside `[rating_min, rating_max]` (or NaN) are dropped
    /// - A repeated (user, movie) pair keeps the last observation
    #[instrument(skip(ratings, catalog), fields(ratings = ratings.len()))]
    pub fn build(ratings: &[Rating], catalog: &Catalog, config: RatingMatrixConfig) -> Self {
        let mut cells: BTreeMap<(UserId, MovieId), f32> = BTreeMap::new();
        let (mut orphans, mut out_of_range) = (0usize, 0usize);

        for rating in ratings {
            if !catalog.contains(rating.movie_id) {
                orphans += 1;
                continue;
            }
            if !(config.rating_min..=config.rating_max).contains(&rating.rating) {
                out_of_range += 1;
                continue;
            }
            cells.insert((rating.user_id, rating.movie_id), rating.rating);
        }

        if orphans > 0 {
            warn!(dropped = orphans, "Dropped ratings for movies missing from the catalog");
        }
        if out_of_range > 0 {
            warn!(
                dropped = out_of_range,
                min = config.rating_min,
                max = config.rating_max,
                "Dropped ratings outside the allowed range"
            );
        }
        let duplicates = ratings.len() - orphans - out_of_range - cells.len();
        if duplicates > 0 {
            debug!(duplicates, "Collapsed repeated (user, movie) ratings");
        }

        let user_dim = cells.keys().map(|&(u, _)| u as usize + 1).max().unwrap_or(0);
        let movie_dim = cells.keys().map(|&(_, m)| m as usize + 1).max().unwrap_or(0);

        let mut by_user: HashMap<UserId, Vec<(u32, f32)>> = HashMap::new();
        let mut by_movie: HashMap<MovieId, Vec<(u32, f32)>> = HashMap::new();
        for (&(user_id, movie_id), &value) in &cells {
            by_user.entry(user_id).or_default().push((movie_id, value));
            by_movie.entry(movie_id).or_default().push((user_id, value));
        }

        let (rows, columns) = rayon::join(
            || to_vectors(by_user, movie_dim),
            || to_vectors(by_movie, user_dim),
        );

        let user_means: HashMap<UserId, f32> = rows
            .par_iter()
            .map(|(&user_id, row)| (user_id, MovieStats::from_values(row.values()).avg_rating))
            .collect();

        let stats: HashMap<MovieId, MovieStats> = columns
            .par_iter()
            .map(|(&movie_id, column)| (movie_id, MovieStats::from_values(column.values())))
            .collect();

        let matrix = Self {
            rows,
            columns,
            user_means,
            stats,
            observations: cells.len(),
            min_ratings: config.min_ratings,
        };

        info!(
            users = matrix.user_count(),
            movies = matrix.columns.len(),
            observations = matrix.observations,
            "Built rating matrix"
        );
        matrix
    }

    /// A user's ratings, indexed by movie id
    pub fn user_ratings(&self, user_id: UserId) -> Option<&SparseVector> {
        self.rows.get(&user_id)
    }

    /// A movie's ratings, indexed by user id
    pub fn movie_ratings(&self, movie_id: MovieId) -> Option<&SparseVector> {
        self.columns.get(&movie_id)
    }

    /// Single cell; `None` means unobserved
    pub fn rating(&self, user_id: UserId, movie_id: MovieId) -> Option<f32> {
        self.rows.get(&user_id)?.get(movie_id)
    }

    pub fn rating_count(&self, movie_id: MovieId) -> usize {
        self.columns.get(&movie_id).map_or(0, SparseVector::nnz)
    }

    /// Fewer ratings than the configured minimum (unrated movies included)
    pub fn is_low_confidence(&self, movie_id: MovieId) -> bool {
        self.rating_count(movie_id) < self.min_ratings
    }

    pub fn user_mean(&self, user_id: UserId) -> Option<f32> {
        self.user_means.get(&user_id).copied()
    }

    pub fn movie_stats(&self, movie_id: MovieId) -> Option<&MovieStats> {
        self.stats.get(&movie_id)
    }

    pub fn user_count(&self) -> usize {
        self.rows.len()
    }

    pub fn observation_count(&self) -> usize {
        self.observations
    }

    pub fn min_ratings(&self) -> usize {
        self.min_ratings
    }

    /// A movie's column with each rating minus that user's mean
    pub fn centered_column(&self, movie_id: MovieId) -> Option<SparseVector> {
        self.columns.get(&movie_id).map(|column| self.center(column))
    }

    /// Every column, raw or mean-centered, ready for similarity
    #[instrument(skip(self))]
    pub fn comparison_columns(&self, mean_center: bool) -> HashMap<MovieId, SparseVector> {
        self.columns
            .par_iter()
            .map(|(&movie_id, column)| {
                let column = if mean_center {
                    self.center(column)
                } else {
                    column.clone()
                };
                (movie_id, column)
            })
            .collect()
    }

    fn center(&self, column: &SparseVector) -> SparseVector {
        column.map_values(|user_id, value| value - self.user_means.get(&user_id).copied().unwrap_or(0.0))
    }
}

fn to_vectors(groups: HashMap<u32, Vec<(u32, f32)>>, dim: usize) -> HashMap<u32, SparseVector> {
    groups
        .into_par_iter()
        .map(|(key, entries)| (key, SparseVector::from_entries(dim, entries)))
        .collect()
}

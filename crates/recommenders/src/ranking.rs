//! Request checks and ranking rules shared by both recommenders.
//!
//! Scores are aggregated as a plain sum over seeds. Ranking is descending by
//! score with ties broken by ascending movie id, so the same inputs always
//! give the same list.

use crate::error::{RecommendError, Result};
use data_loader::{Catalog, MovieId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// A candidate movie with its combined score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredMovie {
    pub movie_id: MovieId,
    pub score: f32,
}

impl ScoredMovie {
    pub fn new(movie_id: MovieId, score: f32) -> Self {
        Self { movie_id, score }
    }
}

/// Validate a request and return the seeds with duplicates removed
///
/// Checks run in a fixed order: malformed request, empty catalog, then
/// unknown seeds (the first unknown one is reported).
pub fn check_request(catalog: &Catalog, seeds: &[MovieId], top_n: usize) -> Result<Vec<MovieId>> {
    if seeds.is_empty() {
        return Err(RecommendError::InvalidRequest(
            "at least one seed movie is required".to_string(),
        ));
    }
    if top_n == 0 {
        return Err(RecommendError::InvalidRequest(
            "top_n must be positive".to_string(),
        ));
    }
    if catalog.is_empty() {
        return Err(RecommendError::EmptyCatalog);
    }

    let mut seen = HashSet::with_capacity(seeds.len());
    let mut unique = Vec::with_capacity(seeds.len());
    for &seed in seeds {
        if !catalog.contains(seed) {
            return Err(RecommendError::unknown_movie(seed));
        }
        if seen.insert(seed) {
            unique.push(seed);
        }
    }
    Ok(unique)
}

/// Add one seed's contributions into the running totals
pub fn accumulate(
    totals: &mut HashMap<MovieId, f32>,
    contributions: impl IntoIterator<Item = (MovieId, f32)>,
) {
    for (movie_id, score) in contributions {
        *totals.entry(movie_id).or_insert(0.0) += score;
    }
}

/// Descending score, then ascending id
pub fn compare_ranked(a: &ScoredMovie, b: &ScoredMovie) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.movie_id.cmp(&b.movie_id))
}

/// Drop excluded ids, sort, and keep the best `top_n`
pub fn rank_scores(
    scores: HashMap<MovieId, f32>,
    exclude: &[MovieId],
    top_n: usize,
) -> Vec<ScoredMovie> {
    let mut ranked: Vec<ScoredMovie> = scores
        .into_iter()
        .filter(|(movie_id, score)| !exclude.contains(movie_id) && score.is_finite())
        .map(|(movie_id, score)| ScoredMovie::new(movie_id, score))
        .collect();

    ranked.sort_unstable_by(compare_ranked);
    ranked.truncate(top_n);
    ranked
}

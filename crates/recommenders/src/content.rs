//! Content Recommender - metadata similarity
//!
//! "Movies that look like the ones you picked"
//!
//! ## Algorithm
//! 1. Validate the request and drop repeated seeds
//! 2. For each seed, score every other catalog movie by cosine similarity of
//!    their feature vectors (or read the seed's precomputed neighbor list)
//! 3. Sum the per-seed scores for each candidate
//! 4. Remove the seeds, sort by score (ties by ascending id), keep top N
//!
//! ## Learning Goals
//! - Arc for sharing read-only catalog and feature data
//! - Rayon par_iter for per-candidate scoring
//! - Builder pattern for optional precomputation

use crate::error::Result;
use crate::features::FeatureTable;
use crate::neighbors::NeighborIndex;
use crate::ranking::{accumulate, check_request, rank_scores, ScoredMovie};
use crate::similarity::{Cosine, SimilarityMeasure, SparseVector};
use crate::traits::Recommender;
use data_loader::{Catalog, MovieId};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Content-based recommender over catalog feature vectors
#[derive(Clone)]
pub struct ContentRecommender {
    /// Shared catalog (read-only, so no Mutex needed)
    catalog: Arc<Catalog>,

    features: Arc<FeatureTable>,

    /// Optional precomputed neighbor lists
    neighbors: Option<Arc<NeighborIndex>>,
}

impl ContentRecommender {
    /// Create a recommender that scores at query time
    pub fn new(catalog: Arc<Catalog>, features: Arc<FeatureTable>) -> Self {
        Self {
            catalog,
            features,
            neighbors: None,
        }
    }

    /// Use an existing neighbor index
    pub fn with_neighbor_index(mut self, index: Arc<NeighborIndex>) -> Self {
        self.neighbors = Some(index);
        self
    }

    /// Precompute neighbor lists for the whole catalog
    ///
    /// `None` keeps every neighbor; `Some(k)` keeps the best `k` per movie.
    /// `Some(0)` is an `InvalidRequest`.
    pub fn with_precomputed_neighbors(self, limit: Option<usize>) -> Result<Self> {
        let index = NeighborIndex::build(
            &self.catalog.all_ids(),
            self.features.vectors(),
            &Cosine,
            limit,
        )?;
        Ok(self.with_neighbor_index(Arc::new(index)))
    }

    /// Feature similarity of two catalog movies
    pub fn similarity(&self, a: MovieId, b: MovieId) -> f32 {
        let empty = SparseVector::default();
        let va = self.features.get(a).unwrap_or(&empty);
        let vb = self.features.get(b).unwrap_or(&empty);
        Cosine.similarity(va, vb)
    }

    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    pub fn neighbor_index(&self) -> Option<&NeighborIndex> {
        self.neighbors.as_deref()
    }

    /// One seed's score for every candidate
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

impl Recommender for ContentRecommender {
    fn name(&self) -> &str {
        "content"
    }

    #[instrument(skip(self), fields(strategy = "content"))]
    fn recommend(&self, seeds: &[MovieId], top_n: usize) -> Result<Vec<ScoredMovie>> {
        let seeds = check_request(&self.catalog, seeds, top_n)?;

        let mut totals: HashMap<MovieId, f32> = HashMap::new();
        for &seed in &seeds {
            accumulate(&mut totals, self.seed_contributions(seed));
        }
        debug!(candidates = totals.len(), "Scored content candidates");

        let ranked = rank_scores(totals, &seeds, top_n);
        debug!(returned = ranked.len(), "Ranked content candidates");
        Ok(ranked)
    }
}

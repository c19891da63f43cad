//! # Query Resolver
//!
//! This module turns a recommendation query into a title list:
//! 1. Validate the request
//! 2. Resolve each seed title through the catalog
//! 3. Dispatch to the chosen recommender
//! 4. Map ids back to movies, dropping seeds and duplicates
//! 5. Truncate to the requested count
//!
//! The engine holds an `Arc<EngineSnapshot>` behind a `RwLock`. A query
//! clones the `Arc` and drops the lock straight away, so a reload never
//! waits for running queries and never changes what they see.

use crate::config::EngineConfig;
use crate::snapshot::EngineSnapshot;
use anyhow::Context;
use data_loader::{Catalog, CatalogError, Dataset, Movie, MovieId, MovieQuery};
use parking_lot::RwLock;
use recommenders::{RecommendError, Result, ScoredMovie};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Which recommender answers a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Content,
    Collaborative,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Content, Strategy::Collaborative];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Content => "content",
            Strategy::Collaborative => "collaborative",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown strategy '{0}' (expected 'content' or 'collaborative')")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "content" => Ok(Strategy::Content),
            "collaborative" => Ok(Strategy::Collaborative),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

/// Final recommendation returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieRecommendation {
    pub movie_id: MovieId,
    pub title: String,
    pub year: Option<u16>,
    pub genres: Vec<String>,
    pub score: f32,
    pub strategy: Strategy,
}

impl MovieRecommendation {
    fn new(movie: &Movie, score: f32, strategy: Strategy) -> Self {
        Self {
            movie_id: movie.id,
            title: movie.title.clone(),
            year: movie.year,
            genres: movie.genres.iter().map(|g| g.as_str().to_string()).collect(),
            score,
            strategy,
        }
    }
}

/// Entry point for queries; owns the current snapshot
pub struct RecommendationEngine {
    snapshot: RwLock<Arc<EngineSnapshot>>,
    config: EngineConfig,
    generations: AtomicU64,
}

impl RecommendationEngine {
    /// Build the engine from an in-memory dataset
    ///
    /// The configuration is validated first, so a bad setting fails here
    /// rather than quietly producing empty or skewed rankings.
    pub fn new(dataset: Dataset, config: EngineConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let snapshot = EngineSnapshot::build(dataset, &config, 1)
            .context("Failed to build engine snapshot")?;
        Ok(Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
            config,
            generations: AtomicU64::new(1),
        })
    }

    /// Load a dataset directory and build the engine
    pub fn load(data_dir: &Path, config: EngineConfig) -> anyhow::Result<Self> {
        let dataset = Dataset::load_from_dir(data_dir)
            .with_context(|| format!("Failed to load dataset from {}", data_dir.display()))?;
        Self::new(dataset, config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The snapshot queries currently run against
    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        self.snapshot.read().clone()
    }

    /// Rebuild from a new dataset and swap it in
    ///
    /// Building happens outside the lock. Returns the new generation.
    #[instrument(skip(self, dataset))]
    pub fn reload(&self, dataset: Dataset) -> anyhow::Result<u64> {
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let fresh = Arc::new(
            EngineSnapshot::build(dataset, &self.config, generation)
                .context("Failed to rebuild engine snapshot")?,
        );

        let mut current = self.snapshot.write();
        // Two concurrent reloads: the later generation wins
        if fresh.generation > current.generation {
            *current = fresh;
        }
        let active = current.generation;
        drop(current);

        info!(generation = active, "Engine snapshot swapped");
        Ok(active)
    }

    /// Recommend titles for the given seed titles
    pub fn recommend<S: AsRef<str>>(
        &self,
        seed_titles: &[S],
        top_n: usize,
        strategy: Strategy,
    ) -> Result<Vec<String>> {
        Ok(self
            .recommend_detailed(seed_titles, top_n, strategy)?
            .into_iter()
            .map(|rec| rec.title)
            .collect())
    }

    /// Recommend movies with scores and metadata
    #[instrument(skip(self, seed_titles), fields(seeds = seed_titles.len()))]
    pub fn recommend_detailed<S: AsRef<str>>(
        &self,
        seed_titles: &[S],
        top_n: usize,
        strategy: Strategy,
    ) -> Result<Vec<MovieRecommendation>> {
        let start = Instant::now();
        if seed_titles.is_empty() {
            return Err(RecommendError::InvalidRequest(
                "at least one seed title is required".to_string(),
            ));
        }
        if top_n == 0 {
            return Err(RecommendError::InvalidRequest(
                "top_n must be positive".to_string(),
            ));
        }

        let snapshot = self.snapshot();
        let catalog = &snapshot.catalog;
        if catalog.is_empty() {
            return Err(RecommendError::EmptyCatalog);
        }

        let seeds = resolve_titles(catalog, seed_titles)?;
        debug!(?seeds, generation = snapshot.generation, "Resolved seed titles");

        let ranked = snapshot.recommender(strategy).recommend(&seeds, top_n)?;
        let recommendations = finalize(catalog, &seeds, ranked, top_n, strategy);

        info!(
            strategy = %strategy,
            returned = recommendations.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Recommendation query complete"
        );
        Ok(recommendations)
    }

    /// Search the current catalog
    pub fn search(&self, query: &MovieQuery) -> Vec<Movie> {
        self.snapshot()
            .catalog
            .search(query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Every title in the current catalog, in id order
    pub fn titles(&self) -> Vec<String> {
        self.snapshot()
            .catalog
            .titles()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

/// Exact title lookup; the first unknown title fails the whole query
fn resolve_titles<S: AsRef<str>>(catalog: &Catalog, titles: &[S]) -> Result<Vec<MovieId>> {
    titles
        .iter()
        .map(|title| {
            catalog
                .lookup_by_title(title.as_ref())
                .map(|movie| movie.id)
                .map_err(|e| match e {
                    CatalogError::TitleNotFound(title) => RecommendError::NotFound(title),
                    other => RecommendError::NotFound(other.to_string()),
                })
        })
        .collect()
}

/// Map ranked ids to movies, keeping seeds out and every id and title unique
fn finalize(
    catalog: &Catalog,
    seeds: &[MovieId],
    ranked: Vec<ScoredMovie>,
    top_n: usize,
    strategy: Strategy,
) -> Vec<MovieRecommendation> {
    let seed_titles: HashSet<&str> = seeds
        .iter()
        .filter_map(|&id| catalog.get_movie(id))
        .map(|movie| movie.title.as_str())
        .collect();

    let mut seen_ids = HashSet::new();
    let mut seen_titles = HashSet::new();
    let mut results = Vec::with_capacity(top_n.min(ranked.len()));

    for scored in ranked {
        if results.len() == top_n {
            break;
        }
        let Some(movie) = catalog.get_movie(scored.movie_id) else {
            warn!(movie_id = scored.movie_id, "Ranked movie is missing from the catalog");
            continue;
        };
        if seeds.contains(&movie.id)
            || seed_titles.contains(movie.title.as_str())
            || !seen_ids.insert(movie.id)
            || !seen_titles.insert(movie.title.as_str())
        {
            continue;
        }
        results.push(MovieRecommendation::new(movie, scored.score, strategy));
    }
    results
}

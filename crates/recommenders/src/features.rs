//! Feature Encoder for the content path.
//!
//! Turns catalog metadata into one sparse vector per movie. All vectors share
//! a single, fixed layout:
//!
//! ```text
//! [ genre_0 .. genre_18 | token_0 .. token_k ]
//! ```
//!
//! - Genre slots are multi-hot, weighted by `genre_weight`
//! - Token slots hold term frequency × smoothed inverse document frequency
//!
//! The token vocabulary is sorted, so the same catalog always produces the
//! same vectors.

use crate::similarity::SparseVector;
use data_loader::{Catalog, Genre, Movie, MovieId};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, instrument};

/// One feature vector per movie, all with the same dimension
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    dimension: usize,
    vocabulary: Vec<String>,
    vectors: HashMap<MovieId, SparseVector>,
}

impl FeatureTable {
    /// Feature vector for a movie
    pub fn get(&self, movie_id: MovieId) -> Option<&SparseVector> {
        self.vectors.get(&movie_id)
    }

    /// All vectors keyed by movie id
    pub fn vectors(&self) -> &HashMap<MovieId, SparseVector> {
        &self.vectors
    }

    /// Shared dimensionality of every vector
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Token vocabulary in slot order (genre slots excluded)
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Human-readable name of a feature slot
    pub fn feature_name(&self, index: usize) -> Option<&str> {
        if index < Genre::ALL.len() {
            Some(Genre::ALL[index].as_str())
        } else {
            self.vocabulary
                .get(index - Genre::ALL.len())
                .map(String::as_str)
        }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Builds a [`FeatureTable`] from a catalog
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    /// Weight of each genre slot
    genre_weight: f32,

    /// Tokens seen in fewer movies than this are left out of the vocabulary
    min_token_df: u32,
}

impl FeatureEncoder {
    /// Create an encoder with default weights
    pub fn new() -> Self {
        Self {
            genre_weight: 1.0,
            min_token_df: 2,
        }
    }

    /// Configure the genre slot weight (default: 1.0)
    pub fn with_genre_weight(mut self, weight: f32) -> Self {
        self.genre_weight = weight.max(0.0);
        self
    }

    /// Configure minimum document frequency for tokens (default: 2)
    pub fn with_min_token_df(mut self, min: u32) -> Self {
        self.min_token_df = min.max(1);
        self
    }

    /// Encode every movie in the catalog
    ///
    /// ## Algorithm
    /// 1. Count in how many movies each token appears (document frequency)
    /// 2. Keep tokens with df >= min_token_df, sorted, as the vocabulary
    /// 3. For each movie in parallel: genre slots + tf × idf token slots
    #[instrument(skip(self, catalog), fields(movies = catalog.len()))]
    pub fn encode(&self, catalog: &Catalog) -> FeatureTable {
        let movies: Vec<&Movie> = catalog.movies().collect();

        let mut doc_freq: BTreeMap<&str, u32> = BTreeMap::new();
        for movie in &movies {
            let distinct: BTreeSet<&str> = movie.tokens.iter().map(String::as_str).collect();
            for token in distinct {
                *doc_freq.entry(token).or_insert(0) += 1;
            }
        }

        let genre_slots = Genre::ALL.len();
        let movie_count = movies.len() as f32;

        // BTreeMap iteration is sorted, which fixes slot order
        let mut slots: HashMap<&str, (u32, f32)> = HashMap::new();
        let mut vocabulary = Vec::new();
        for (token, df) in doc_freq {
            if df < self.min_token_df {
                continue;
            }
            let slot = (genre_slots + vocabulary.len()) as u32;
            slots.insert(token, (slot, smoothed_idf(movie_count, df)));
            vocabulary.push(token.to_string());
        }

        let dimension = genre_slots + vocabulary.len();
        debug!(
            dimension,
            vocabulary = vocabulary.len(),
            "Built feature vocabulary"
        );

        let vectors: HashMap<MovieId, SparseVector> = movies
            .par_iter()
            .map(|movie| (movie.id, self.encode_movie(movie, &slots, dimension)))
            .collect();

        info!(
            vectors = vectors.len(),
            dimension, "Encoded catalog features"
        );

        FeatureTable {
            dimension,
            vocabulary,
            vectors,
        }
    }

    fn encode_movie(
        &self,
        movie: &Movie,
        slots: &HashMap<&str, (u32, f32)>,
        dimension: usize,
    ) -> SparseVector {
        let mut term_freq: BTreeMap<&str, u32> = BTreeMap::new();
        for token in &movie.tokens {
            *term_freq.entry(token.as_str()).or_insert(0) += 1;
        }

        let genre_entries = movie
            .genres
            .iter()
            .map(|genre| (genre.index() as u32, self.genre_weight));
        let token_entries = term_freq.into_iter().filter_map(|(token, tf)| {
            slots
                .get(token)
                .map(|&(slot, idf)| (slot, tf as f32 * idf))
        });

        SparseVector::from_entries(dimension, genre_entries.chain(token_entries))
    }
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// ln((1 + n) / (1 + df)) + 1, always positive
fn smoothed_idf(movie_count: f32, df: u32) -> f32 {
    ((1.0 + movie_count) / (1.0 + df as f32)).ln() + 1.0
}

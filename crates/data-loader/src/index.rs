//! Dataset loading: files → parsed rows → Catalog.
//!
//! This module ties the parser and the catalog together:
//! - Locate movies.csv, ratings.csv and the optional tags.csv
//! - Parse them in parallel with Rayon
//! - Insert movies into the Catalog, skipping duplicate ids and titles
//! - Drop ratings that point at movies the catalog doesn't know

use crate::catalog::Catalog;
use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

/// File names expected inside a dataset directory
pub const MOVIES_FILE: &str = "movies.csv";
pub const RATINGS_FILE: &str = "ratings.csv";
pub const TAGS_FILE: &str = "tags.csv";

/// Everything the engine needs, freshly loaded
///
/// The catalog owns the movies; `ratings` holds only observations whose
/// movie exists in the catalog.
#[derive(Debug, Default)]
pub struct Dataset {
    pub catalog: Catalog,
    pub ratings: Vec<Rating>,
}

fn open(path: &Path) -> Result<BufReader<File>> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(BufReader::new(File::open(path)?))
}

impl Dataset {
    /// Load a dataset from a directory
    ///
    /// This is the main entry point for loading data.
    ///
    /// Steps:
    /// 1. Parse tags (optional) and ratings in parallel with movies
    /// 2. Build the catalog, keeping the first of any duplicate id or title
    /// 3. Keep only ratings whose movie made it into the catalog
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        info!(dir = %data_dir.display(), "Loading dataset");

        let movies_path = data_dir.join(MOVIES_FILE);
        let ratings_path = data_dir.join(RATINGS_FILE);
        let tags_path = data_dir.join(TAGS_FILE);

        // Movies need the tags, so tags + movies run on one side of the join
        // and ratings on the other
        let (movies, ratings) = rayon::join(
            || -> Result<Vec<Movie>> {
                let tags = if tags_path.exists() {
                    parser::parse_tags(open(&tags_path)?, TAGS_FILE)?
                } else {
                    info!("No {} found, using title tokens only", TAGS_FILE);
                    BTreeMap::new()
                };
                parser::parse_movies(open(&movies_path)?, MOVIES_FILE, &tags)
            },
            || -> Result<Vec<Rating>> {
                parser::parse_ratings(open(&ratings_path)?, RATINGS_FILE)
            },
        );

        let dataset = Self::from_parts(movies?, ratings?);
        let (movies, ratings) = dataset.counts();
        info!(movies, ratings, "Dataset loaded");
        Ok(dataset)
    }

    /// Assemble a dataset from already-parsed rows
    ///
    /// Used by the loader and by tests that build data in memory.
    pub fn from_parts(movies: Vec<Movie>, ratings: Vec<Rating>) -> Self {
        let mut catalog = Catalog::new();
        for movie in movies {
            let id = movie.id;
            if let Err(e) = catalog.insert_movie(movie) {
                warn!(movie_id = id, error = %e, "Skipping movie");
            }
        }

        let total = ratings.len();
        let ratings: Vec<Rating> = ratings
            .into_iter()
            .filter(|r| catalog.contains(r.movie_id))
            .collect();
        if ratings.len() < total {
            warn!(
                dropped = total - ratings.len(),
                "Dropped ratings referencing movies missing from the catalog"
            );
        }

        Self { catalog, ratings }
    }

    /// Get counts for debugging/validation: (movies, ratings)
    pub fn counts(&self) -> (usize, usize) {
        (self.catalog.len(), self.ratings.len())
    }
}

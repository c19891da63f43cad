//! The movie catalog: canonical identity and metadata store.
//!
//! A `Catalog` is filled once while loading and then only read. It keeps:
//! - movies ordered by id (so iteration is deterministic)
//! - an exact title → id index for resolving user input
//! - secondary genre and year indices for search

use crate::error::CatalogError;
use crate::types::{Genre, Movie, MovieId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Read-only movie store with title, genre and year indices
#[derive(Debug, Default)]
pub struct Catalog {
    movies: BTreeMap<MovieId, Movie>,
    title_index: HashMap<String, MovieId>,
    genre_index: HashMap<Genre, Vec<MovieId>>,
    year_index: BTreeMap<u16, Vec<MovieId>>,
}

/// Search criteria for [`Catalog::search`]
///
/// Every field is optional; an empty query matches the whole catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieQuery {
    /// Case-insensitive substring of the title
    pub title_contains: Option<String>,
    pub genre: Option<Genre>,
    pub min_year: Option<u16>,
    pub max_year: Option<u16>,
}

impl MovieQuery {
    fn matches(&self, movie: &Movie, title_lower: Option<&str>) -> bool {
        if let Some(needle) = title_lower {
            if !movie.title.to_lowercase().contains(needle) {
                return false;
            }
        }
        if let Some(genre) = self.genre {
            if !movie.has_genre(genre) {
                return false;
            }
        }
        // A movie with an unknown year can't satisfy a year bound
        if self.min_year.is_some() || self.max_year.is_some() {
            let Some(year) = movie.year else {
                return false;
            };
            if self.min_year.is_some_and(|min| year < min) {
                return false;
            }
            if self.max_year.is_some_and(|max| year > max) {
                return false;
            }
        }
        true
    }
}

impl Catalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a movie, keeping every index in step
    ///
    /// Ids and titles are both unique; a clash leaves the catalog untouched.
    pub fn insert_movie(&mut self, movie: Movie) -> Result<(), CatalogError> {
        if self.movies.contains_key(&movie.id) {
            return Err(CatalogError::DuplicateId(movie.id));
        }
        if let Some(&existing) = self.title_index.get(&movie.title) {
            return Err(CatalogError::DuplicateTitle {
                title: movie.title,
                existing,
            });
        }

        for &genre in &movie.genres {
            self.genre_index.entry(genre).or_default().push(movie.id);
        }
        if let Some(year) = movie.year {
            self.year_index.entry(year).or_default().push(movie.id);
        }
        self.title_index.insert(movie.title.clone(), movie.id);
        self.movies.insert(movie.id, movie);
        Ok(())
    }

    /// Resolve a title by case-sensitive exact match
    pub fn lookup_by_title(&self, title: &str) -> Result<&Movie, CatalogError> {
        self.title_index
            .get(title)
            .and_then(|id| self.movies.get(id))
            .ok_or_else(|| CatalogError::TitleNotFound(title.to_string()))
    }

    /// Get a movie by ID
    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.movies.contains_key(&id)
    }

    /// All movie ids in ascending order
    pub fn all_ids(&self) -> Vec<MovieId> {
        self.movies.keys().copied().collect()
    }

    /// Iterate movies in ascending id order
    pub fn movies(&self) -> impl Iterator<Item = &Movie> {
        self.movies.values()
    }

    /// All titles in id order, as used to populate selection lists
    pub fn titles(&self) -> Vec<&str> {
        self.movies.values().map(|m| m.title.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Get all movies in a specific genre
    pub fn movies_by_genre(&self, genre: Genre) -> &[MovieId] {
        self.genre_index
            .get(&genre)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Movies released between `start` and `end`, both inclusive, by year
    pub fn movies_in_year_range(&self, start: u16, end: u16) -> Vec<MovieId> {
        if start > end {
            return Vec::new();
        }
        self.year_index
            .range(start..=end)
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    /// Filter the catalog by title substring, genre and year range
    ///
    /// Results come back in ascending id order.
    pub fn search(&self, query: &MovieQuery) -> Vec<&Movie> {
        let title_lower = query
            .title_contains
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        self.movies
            .values()
            .filter(|movie| query.matches(movie, title_lower.as_deref()))
            .collect()
    }
}

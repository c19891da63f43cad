//! # Data Loader Crate
//!
//! This crate loads the movie catalog and rating history from MovieLens-style
//! CSV files and exposes them as read-only structures.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, Genre, Rating, ids)
//! - **catalog**: The `Catalog` with title, genre and year indices
//! - **parser**: Parse CSV rows into Rust structs, skipping malformed ones
//! - **index**: Load a whole dataset directory into a `Dataset`
//! - **error**: Error types for loading and catalog lookups
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::Dataset;
//! use std::path::Path;
//!
//! let dataset = Dataset::load_from_dir(Path::new("data/ml-latest-small"))?;
//!
//! let movie = dataset.catalog.lookup_by_title("Toy Story (1995)")?;
//! println!("{} has genres {:?}", movie.title, movie.genres);
//! ```

// Public modules
pub mod catalog;
pub mod error;
pub mod index;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use catalog::{Catalog, MovieQuery};
pub use error::{CatalogError, DataLoadError, Result};
pub use index::Dataset;
pub use types::{
    // Type aliases
    MovieId,
    UserId,
    // Core types
    Genre,
    Movie,
    Rating,
};

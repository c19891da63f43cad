//! Error types for the data-loader crate.
//!
//! Two error enums live here:
//! - [`DataLoadError`] for failures while reading the CSV sources
//! - [`CatalogError`] for catalog inserts and title lookups
//!
//! Row-level problems (a bad number, a missing title) are not errors at this
//! level: the parser logs them and skips the row. Only problems that make the
//! whole source unusable surface as a `DataLoadError`.

use crate::types::MovieId;
use thiserror::Error;

/// Errors that can occur while loading a dataset
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV header itself could not be read
    #[error("Invalid header in {file}: {reason}")]
    InvalidHeader { file: String, reason: String },

    /// A column the source cannot do without is absent from the header
    #[error("Missing required column '{column}' in {file}")]
    MissingColumn { file: String, column: String },
}

/// Errors raised by [`Catalog`](crate::Catalog) operations
///
/// The loader treats `DuplicateId` and `DuplicateTitle` as skippable rows;
/// `TitleNotFound` is what a caller sees when a seed title does not exist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// No movie carries exactly this title
    #[error("Movie title not found: {0}")]
    TitleNotFound(String),

    /// A movie with this id is already in the catalog
    #[error("Duplicate movie id {0}")]
    DuplicateId(MovieId),

    /// Another movie already uses this title
    #[error("Duplicate movie title '{title}' (already used by movie {existing})")]
    DuplicateTitle { title: String, existing: MovieId },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;

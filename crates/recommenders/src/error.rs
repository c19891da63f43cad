use data_loader::MovieId;
use thiserror::Error;

/// Errors a recommendation query can fail with
///
/// A query either produces a ranking or one of these; there is no fallback
/// ranking.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecommendError {
    /// A seed is not in the catalog (carries the title or id as given)
    #[error("Movie not found: {0}")]
    NotFound(String),

    /// Every seed of a collaborative query has zero ratings
    #[error("Not enough rating data: none of the {seeds} seed movies has been rated")]
    InsufficientData { seeds: usize },

    #[error("The catalog is empty")]
    EmptyCatalog,

    /// The request itself is malformed (no seeds, zero results requested)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl RecommendError {
    pub fn unknown_movie(movie_id: MovieId) -> Self {
        Self::NotFound(format!("movie id {}", movie_id))
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, RecommendError>;

//! Core trait shared by the recommendation strategies.
//!
//! The Query Resolver picks exactly one `Recommender` per query and talks to
//! it only through this trait.

use crate::error::Result;
use crate::ranking::ScoredMovie;
use data_loader::MovieId;

/// A strategy that turns seed movies into a ranked candidate list.
///
/// ## Design Note
/// - `Send + Sync` lets one recommender serve many concurrent queries
/// - Implementations only read their precomputed structures; `&self` is enough
pub trait Recommender: Send + Sync {
    /// Returns the name of this strategy (for logging/debugging)
    fn name(&self) -> &str;

    /// Rank candidates for the given seeds.
    ///
    /// # Arguments
    /// * `seeds` - Catalog ids of the seed movies (at least one)
    /// * `top_n` - Maximum number of results
    ///
    /// # Returns
    /// * `Ok(Vec<ScoredMovie>)` - Up to `top_n` movies, best first, seeds excluded
    /// * `Err` - `InvalidRequest`, `EmptyCatalog`, `NotFound` or
    ///   `InsufficientData`
    fn recommend(&self, seeds: &[MovieId], top_n: usize) -> Result<Vec<ScoredMovie>>;
}

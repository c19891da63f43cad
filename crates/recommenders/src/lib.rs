//! # Recommenders Crate
//!
//! This crate turns seed movies into ranked recommendation lists.
//!
//! ## Components
//!
//! ### Content Recommender
//! Metadata similarity:
//! - Genres and title/tag tokens encoded by the `FeatureEncoder`
//! - Cosine similarity between feature vectors
//!
//! ### Collaborative Recommender
//! Item-item neighborhood over the `RatingMatrix`:
//! - Adjusted cosine over users who rated both movies
//! - Movies with few ratings are flagged and pushed down, never dropped
//!
//! Both sum per-seed similarities, remove the seeds, and rank by score with
//! ties broken by ascending movie id. Either can precompute a
//! `NeighborIndex` instead of scoring at query time.
//!
//! ## Example Usage
//!
//! ```ignore
//! use recommenders::{ContentRecommender, FeatureEncoder, Recommender};
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(dataset.catalog);
//! let features = Arc::new(FeatureEncoder::new().encode(&catalog));
//! let content = ContentRecommender::new(catalog.clone(), features);
//!
//! let ranked = content.recommend(&[1, 2, 3], 10)?;
//! ```
//!
//! ## Learning Goals
//!
//! 1. **Sparse vectors**: Sorted index/value pairs instead of dense matrices
//! 2. **Traits at the seams**: `Recommender` and `SimilarityMeasure`
//! 3. **Rayon**: Parallel neighbor lists and candidate scoring
//! 4. **Deterministic ranking**: Total ordering on `f32` with an id tie-break

// Public modules
pub mod collaborative;
pub mod content;
pub mod error;
pub mod features;
pub mod neighbors;
pub mod ranking;
pub mod rating_matrix;
pub mod similarity;
pub mod traits;

// Re-export commonly used types
pub use collaborative::CollaborativeRecommender;
pub use content::ContentRecommender;
pub use error::{RecommendError, Result};
pub use features::{FeatureEncoder, FeatureTable};
pub use neighbors::NeighborIndex;
pub use ranking::ScoredMovie;
pub use rating_matrix::{MovieStats, RatingMatrix, RatingMatrixConfig};
pub use similarity::{cosine_similarity, CoRatedCosine, Cosine, SimilarityMeasure, SparseVector};
pub use traits::Recommender;

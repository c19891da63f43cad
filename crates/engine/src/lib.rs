//! # Engine Crate
//!
//! The query side of MovieMate: resolves seed titles, picks a recommender,
//! and returns a clean top-N title list.
//!
//! ## Main Components
//!
//! - **config**: `EngineConfig`, loaded from TOML with per-field defaults
//! - **snapshot**: `EngineSnapshot`, the immutable catalog + models bundle
//! - **resolver**: `RecommendationEngine`, the Query Resolver
//!
//! ## Example Usage
//!
//! ```ignore
//! use engine::{EngineConfig, RecommendationEngine, Strategy};
//! use std::path::Path;
//!
//! let engine = RecommendationEngine::load(Path::new("data/ml-latest-small"), EngineConfig::default())?;
//! let titles = engine.recommend(
//!     &["Toy Story (1995)", "Jumanji (1995)", "Heat (1995)"],
//!     10,
//!     Strategy::Content,
//! )?;
//! ```

pub mod config;
pub mod resolver;
pub mod snapshot;

pub use config::EngineConfig;
pub use resolver::{MovieRecommendation, RecommendationEngine, Strategy, UnknownStrategy};
pub use snapshot::EngineSnapshot;

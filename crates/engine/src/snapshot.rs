//! Immutable engine state built from one dataset.
//!
//! A snapshot is built once, then only read. Reloading builds a fresh
//! snapshot; queries already holding the old one keep using it.

use crate::config::EngineConfig;
use crate::resolver::Strategy;
use data_loader::{Catalog, Dataset};
use recommenders::{
    CollaborativeRecommender, ContentRecommender, RatingMatrix, Recommender, Result,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Catalog plus both prepared recommenders
pub struct EngineSnapshot {
    /// Increases by one with every reload
    pub generation: u64,
    pub catalog: Arc<Catalog>,
    pub content: ContentRecommender,
    pub collaborative: CollaborativeRecommender,
}

impl EngineSnapshot {
    /// Build both models from a dataset
    ///
    /// The content and collaborative sides share nothing but the catalog, so
    /// they are built in parallel. Fails only on a neighbor limit of zero.
    #[instrument(skip(dataset, config), fields(movies = dataset.catalog.len(), ratings = dataset.ratings.len()))]
    pub fn build(dataset: Dataset, config: &EngineConfig, generation: u64) -> Result<Self> {
        let start = Instant::now();
        let Dataset { catalog, ratings } = dataset;
        let catalog = Arc::new(catalog);

        let (content, collaborative) = rayon::join(
            || -> Result<ContentRecommender> {
                let features = Arc::new(config.feature_encoder().encode(&catalog));
                let content = ContentRecommender::new(catalog.clone(), features);
                match config.neighbor_limit {
                    Some(limit) => content.with_precomputed_neighbors(Some(limit)),
                    None => Ok(content),
                }
            },
            || -> Result<CollaborativeRecommender> {
                let matrix = Arc::new(RatingMatrix::build(
                    &ratings,
                    &catalog,
                    config.rating_matrix_config(),
                ));
                let collaborative = CollaborativeRecommender::new(catalog.clone(), matrix)
                    .with_mean_centering(config.mean_center)
                    .with_low_confidence_weight(config.low_confidence_weight);
                match config.neighbor_limit {
                    Some(limit) => collaborative.with_precomputed_neighbors(Some(limit)),
                    None => Ok(collaborative),
                }
            },
        );
        let (content, collaborative) = (content?, collaborative?);

        info!(
            generation,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built engine snapshot"
        );

        Ok(Self {
            generation,
            catalog,
            content,
            collaborative,
        })
    }

    /// The recommender serving a strategy
    pub fn recommender(&self, strategy: Strategy) -> &dyn Recommender {
        match strategy {
            Strategy::Content => &self.content,
            Strategy::Collaborative => &self.collaborative,
        }
    }
}

//! Engine configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all) gives
//! a working engine. Example:
//!
//! ```toml
//! min_ratings = 5
//! low_confidence_weight = 0.25
//! neighbor_limit = 50
//! ```

use anyhow::{Context, Result, bail};
use recommenders::{FeatureEncoder, RatingMatrixConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for building and querying the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Movies with fewer ratings are low-confidence
    #[serde(default = "default_min_ratings")]
    pub min_ratings: usize,

    /// Penalty applied to low-confidence collaborative candidates, in (0, 1]
    #[serde(default = "default_low_confidence_weight")]
    pub low_confidence_weight: f32,

    #[serde(default = "default_rating_min")]
    pub rating_min: f32,

    #[serde(default = "default_rating_max")]
    pub rating_max: f32,

    /// Compare rating columns after subtracting each user's mean
    #[serde(default = "default_mean_center")]
    pub mean_center: bool,

    #[serde(default = "default_genre_weight")]
    pub genre_weight: f32,

    /// Minimum number of movies a token must appear in to become a feature
    #[serde(default = "default_min_token_df")]
    pub min_token_df: u32,

    /// `None` scores at query time; `Some(k)` precomputes k neighbors per movie
    #[serde(default)]
    pub neighbor_limit: Option<usize>,

    /// Result count used when the caller doesn't pick one
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,
}

fn default_min_ratings() -> usize {
    3
}

fn default_low_confidence_weight() -> f32 {
    0.5
}

fn default_rating_min() -> f32 {
    0.5
}

fn default_rating_max() -> f32 {
    5.0
}

fn default_mean_center() -> bool {
    true
}

fn default_genre_weight() -> f32 {
    1.0
}

fn default_min_token_df() -> u32 {
    2
}

fn default_top_n() -> usize {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_ratings: default_min_ratings(),
            low_confidence_weight: default_low_confidence_weight(),
            rating_min: default_rating_min(),
            rating_max: default_rating_max(),
            mean_center: default_mean_center(),
            genre_weight: default_genre_weight(),
            min_token_df: default_min_token_df(),
            neighbor_limit: None,
            default_top_n: default_top_n(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine can't work with
    pub fn validate(&self) -> Result<()> {
        if !(self.rating_min <= self.rating_max) {
            bail!(
                "rating_min ({}) must not exceed rating_max ({})",
                self.rating_min,
                self.rating_max
            );
        }
        if !(self.low_confidence_weight > 0.0 && self.low_confidence_weight <= 1.0) {
            bail!(
                "low_confidence_weight must be in (0, 1], got {}",
                self.low_confidence_weight
            );
        }
        if !(self.genre_weight >= 0.0) {
            bail!("genre_weight must be non-negative, got {}", self.genre_weight);
        }
        if self.default_top_n == 0 {
            bail!("default_top_n must be positive");
        }
        if self.neighbor_limit == Some(0) {
            bail!("neighbor_limit must be positive when set");
        }
        Ok(())
    }

    /// Configure the low-confidence threshold (default: 3)
    pub fn with_min_ratings(mut self, min: usize) -> Self {
        self.min_ratings = min;
        self
    }

    /// Configure the low-confidence penalty (default: 0.5)
    pub fn with_low_confidence_weight(mut self, weight: f32) -> Self {
        self.low_confidence_weight = weight;
        self
    }

    /// Configure the accepted rating range (default: 0.5 to 5.0)
    pub fn with_rating_range(mut self, min: f32, max: f32) -> Self {
        self.rating_min = min;
        self.rating_max = max;
        self
    }

    pub fn with_mean_center(mut self, enabled: bool) -> Self {
        self.mean_center = enabled;
        self
    }

    pub fn with_genre_weight(mut self, weight: f32) -> Self {
        self.genre_weight = weight;
        self
    }

    pub fn with_min_token_df(mut self, min: u32) -> Self {
        self.min_token_df = min;
        self
    }

    /// Precompute neighbor lists (default: score at query time)
    pub fn with_neighbor_limit(mut self, limit: Option<usize>) -> Self {
        self.neighbor_limit = limit;
        self
    }

    pub fn with_default_top_n(mut self, top_n: usize) -> Self {
        self.default_top_n = top_n;
        self
    }

    pub fn rating_matrix_config(&self) -> RatingMatrixConfig {
        RatingMatrixConfig {
            min_ratings: self.min_ratings,
            rating_min: self.rating_min,
            rating_max: self.rating_max,
        }
    }

    pub fn feature_encoder(&self) -> FeatureEncoder {
        FeatureEncoder::new()
            .with_genre_weight(self.genre_weight)
            .with_min_token_df(self.min_token_df)
    }
}

//! # bookrec
//!
//! An item-based collaborative-filtering book recommender.
//!
//! Training reads `ratings.csv` and `books.csv`, computes item-item
//! similarity over co-rating vectors plus a per-item mean-rating table for
//! cold start, and writes the result to a `models/` directory. The server
//! loads that directory once at startup and answers read-only queries.
//!
//! ## Quick Start
//!
//! ```bash
//! bookrec train --data-dir data --model-dir models
//! bookrec serve --model-dir models --port 8000
//! ```
//!
//! ## Crate Structure
//!
//! - `bookrec-core` - Records, CSV loading, similarity, recommendation, search
//! - `bookrec-storage` - Model artifact directory (manifest, checksums)
//! - `bookrec-api` - REST API

use std::path::PathBuf;
use tracing::info;

// Re-export core types
pub use bookrec_core::{
    Book, Catalog, Dataset, Model, Rating, RatingMatrix,
    Recommendations, Recommender, ScoredItem, SimilarityMetric, SimilarityTable,
    Strategy, TrainedModel, TrainingStats, UnknownBookPolicy,
    Error, Result,
};

// Re-export storage
pub use bookrec_storage::{ArtifactStore, Manifest};

// Re-export API
pub use bookrec_api::{ApiError, RestApi};

/// Settings for a training run
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub data_dir: PathBuf,
    pub model_dir: PathBuf,
    pub metric: SimilarityMetric,
    pub unknown_books: UnknownBookPolicy,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            model_dir: PathBuf::from("models"),
            metric: SimilarityMetric::Cosine,
            unknown_books: UnknownBookPolicy::Drop,
        }
    }
}

/// Settings for the HTTP server
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub model_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

/// Load the CSVs, train, and persist the artifact.
pub fn train_and_save(config: &TrainConfig) -> Result<Manifest> {
    let dataset = Dataset::load(&config.data_dir, config.unknown_books)?;
    info!(
        "Loaded {} ratings and {} books",
        dataset.ratings().len(),
        dataset.catalog().len()
    );

    let trained = bookrec_core::train(&dataset, config.metric)?;
    ArtifactStore::new(&config.model_dir).save(&trained)
}

//! Ensemble regression capability, the reference random forest, and the snapshot registry
//! that serves trained models to concurrent readers.

pub mod dataset;
pub mod features;
pub mod forest;
pub mod metrics;
pub mod registry;
pub mod store;
mod tree;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use dataset::{base_price, Dataset, LabeledSample, SyntheticDataset};
pub use features::{PropertyFeatures, FEATURE_COUNT, FEATURE_NAMES};
pub use forest::{ForestParams, ForestTrainer, RandomForest};
pub use metrics::{RegressionScores, TrainingMetrics};
pub use registry::{ModelRegistry, ModelState};
pub use store::{ModelStore, StoreError};

/// Read-only view of a trained ensemble.
pub trait EnsembleRegressor: Send + Sync {
    /// True once at least one training cycle has completed.
    fn is_trained(&self) -> bool;
    fn predict(&self, features: &PropertyFeatures) -> f64;
    /// One prediction per ensemble member, in member order.
    fn predict_per_member(&self, features: &PropertyFeatures) -> Vec<f64>;
    /// R² on data withheld from training, when a held-out split was used.
    fn held_out_r_squared(&self) -> Option<f64>;
    fn feature_importances(&self) -> BTreeMap<String, f64>;
    fn feature_names(&self) -> Vec<String>;
    fn member_count(&self) -> usize;

    fn max_depth(&self) -> Option<usize> {
        None
    }

    fn metrics(&self) -> Option<&TrainingMetrics> {
        None
    }
}

/// Produces a fresh model from a dataset. Models are persisted as JSON blobs.
pub trait EnsembleTrainer: Send + Sync {
    type Model: EnsembleRegressor + Serialize + DeserializeOwned + 'static;

    fn train(&self, dataset: &Dataset) -> Result<Self::Model, TrainingError>;
}

/// Failures raised while fitting a model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrainingError {
    #[error("cannot train on an empty dataset")]
    EmptyDataset,
    #[error("invalid training parameters: {0}")]
    InvalidParameters(String),
    #[error("target price at row {row} is not a finite number")]
    NonFiniteTarget { row: usize },
    #[error("a training run is already in progress")]
    InProgress,
}

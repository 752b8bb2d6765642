use std::collections::BTreeMap;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::dataset::Dataset;
use super::features::{PropertyFeatures, FEATURE_COUNT, FEATURE_NAMES};
use super::metrics::{RegressionScores, TrainingMetrics};
use super::tree::{RegressionTree, Row, TreeParams};
use super::{EnsembleRegressor, EnsembleTrainer, TrainingError};

/// Hyper-parameters for the bagged regression-tree ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub test_size: f64,
    pub random_state: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 10,
            min_samples_split: 5,
            test_size: 0.2,
            random_state: 42,
        }
    }
}

impl ForestParams {
    fn validate(&self) -> Result<(), TrainingError> {
        if self.n_estimators == 0 {
            return Err(TrainingError::InvalidParameters(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(TrainingError::InvalidParameters(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(TrainingError::InvalidParameters(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.test_size) {
            return Err(TrainingError::InvalidParameters(format!(
                "test_size must lie in [0, 1), got {}",
                self.test_size
            )));
        }
        Ok(())
    }
}

/// Fits [`RandomForest`] models from labeled datasets.
#[derive(Debug, Clone, Default)]
pub struct ForestTrainer {
    params: ForestParams,
}

impl ForestTrainer {
    pub fn new(params: ForestParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }
}

impl EnsembleTrainer for ForestTrainer {
    type Model = RandomForest;

    fn train(&self, dataset: &Dataset) -> Result<RandomForest, TrainingError> {
        let params = self.params;
        params.validate()?;

        if dataset.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }
        if let Some(row) = dataset
            .samples()
            .iter()
            .position(|sample| !sample.price.is_finite())
        {
            return Err(TrainingError::NonFiniteTarget { row });
        }

        let rows: Vec<Row> = dataset
            .samples()
            .iter()
            .map(|sample| sample.features.to_vector())
            .collect();
        let targets: Vec<f64> = dataset.samples().iter().map(|sample| sample.price).collect();

        let mut rng = StdRng::seed_from_u64(params.random_state);
        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.shuffle(&mut rng);

        let held_out = (rows.len() as f64 * params.test_size).ceil() as usize;
        let (test_indices, train_indices) = order.split_at(held_out.min(rows.len()));
        if train_indices.is_empty() {
            return Err(TrainingError::InvalidParameters(format!(
                "{} samples leave nothing to train on with test_size {}",
                rows.len(),
                params.test_size
            )));
        }

        info!(
            train_samples = train_indices.len(),
            test_samples = test_indices.len(),
            n_estimators = params.n_estimators,
            "training random forest"
        );

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
        };

        let mut trees = Vec::with_capacity(params.n_estimators);
        let mut importance_totals = [0.0; FEATURE_COUNT];
        for _ in 0..params.n_estimators {
            let bootstrap: Vec<usize> = (0..train_indices.len())
                .map(|_| train_indices[rng.gen_range(0..train_indices.len())])
                .collect();
            let (tree, importances) = RegressionTree::fit(&rows, &targets, bootstrap, tree_params);

            let total: f64 = importances.iter().sum();
            if total > 0.0 {
                for (slot, value) in importance_totals.iter_mut().zip(importances) {
                    *slot += value / total;
                }
            }
            trees.push(tree);
        }

        let importance_sum: f64 = importance_totals.iter().sum();
        let feature_importance = FEATURE_NAMES
            .iter()
            .zip(importance_totals)
            .map(|(name, value)| {
                let normalized = if importance_sum > 0.0 {
                    value / importance_sum
                } else {
                    0.0
                };
                (name.to_string(), normalized)
            })
            .collect();

        let mut forest = RandomForest {
            version: env!("CARGO_PKG_VERSION").to_string(),
            feature_names: FEATURE_NAMES.iter().map(|name| name.to_string()).collect(),
            params,
            trees,
            metrics: None,
        };

        let score = |indices: &[usize]| {
            let expected: Vec<f64> = indices.iter().map(|i| targets[*i]).collect();
            let predicted: Vec<f64> = indices
                .iter()
                .map(|i| forest.predict_row(&rows[*i]))
                .collect();
            RegressionScores::compute(&expected, &predicted)
        };
        let train = score(train_indices).ok_or(TrainingError::EmptyDataset)?;
        let test = score(test_indices);

        let metrics = TrainingMetrics {
            train,
            test,
            feature_importance,
            samples_trained: train_indices.len(),
            samples_held_out: test_indices.len(),
            trained_at: Utc::now(),
        };

        match &metrics.test {
            Some(test) => info!(
                r2 = test.r2,
                rmse = test.rmse,
                mae = test.mae,
                "training complete"
            ),
            None => info!(r2 = metrics.train.r2, "training complete without held-out set"),
        }

        forest.metrics = Some(metrics);
        Ok(forest)
    }
}

/// Bagged ensemble of regression trees; the prediction is the member mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    version: String,
    feature_names: Vec<String>,
    params: ForestParams,
    trees: Vec<RegressionTree>,
    metrics: Option<TrainingMetrics>,
}

impl RandomForest {
    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    fn predict_row(&self, row: &Row) -> f64 {
        if self.trees.is_empty() {
            return f64::NAN;
        }
        let total: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        total / self.trees.len() as f64
    }
}

impl EnsembleRegressor for RandomForest {
    fn is_trained(&self) -> bool {
        !self.trees.is_empty()
    }

    fn predict(&self, features: &PropertyFeatures) -> f64 {
        self.predict_row(&features.to_vector())
    }

    fn predict_per_member(&self, features: &PropertyFeatures) -> Vec<f64> {
        let row = features.to_vector();
        self.trees.iter().map(|tree| tree.predict(&row)).collect()
    }

    fn held_out_r_squared(&self) -> Option<f64> {
        self.metrics
            .as_ref()
            .and_then(|metrics| metrics.test)
            .map(|scores| scores.r2)
    }

    fn feature_importances(&self) -> BTreeMap<String, f64> {
        self.metrics
            .as_ref()
            .map(|metrics| metrics.feature_importance.clone())
            .unwrap_or_default()
    }

    fn feature_names(&self) -> Vec<String> {
        self.feature_names.clone()
    }

    fn member_count(&self) -> usize {
        self.trees.len()
    }

    fn max_depth(&self) -> Option<usize> {
        Some(self.params.max_depth)
    }

    fn metrics(&self) -> Option<&TrainingMetrics> {
        self.metrics.as_ref()
    }
}

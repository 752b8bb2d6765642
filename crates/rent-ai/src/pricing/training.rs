use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::{info, warn};

use super::domain::TrainingReport;
use super::service::PricingError;
use crate::model::registry::TrainingFlag;
use crate::model::{
    Dataset, EnsembleRegressor, EnsembleTrainer, ModelRegistry, ModelState, ModelStore,
    StoreError, SyntheticDataset,
};

/// Dataset size and seed used when training is triggered without explicit parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingPlan {
    pub samples: usize,
    pub seed: u64,
}

impl Default for TrainingPlan {
    fn default() -> Self {
        Self {
            samples: 500,
            seed: 42,
        }
    }
}

/// Generate data, fit, swap the snapshot, then persist model and dataset when configured.
pub struct TrainingPipeline<T: EnsembleTrainer> {
    registry: ModelRegistry<T>,
    plan: TrainingPlan,
    model_store: Option<ModelStore>,
    dataset_path: Option<PathBuf>,
    warming_up: AtomicBool,
}

impl<T> TrainingPipeline<T>
where
    T: EnsembleTrainer + 'static,
{
    pub fn new(registry: ModelRegistry<T>, plan: TrainingPlan) -> Self {
        Self {
            registry,
            plan,
            model_store: None,
            dataset_path: None,
            warming_up: AtomicBool::new(false),
        }
    }

    pub fn with_model_store(mut self, store: ModelStore) -> Self {
        self.model_store = Some(store);
        self
    }

    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = Some(path.into());
        self
    }

    pub fn registry(&self) -> &ModelRegistry<T> {
        &self.registry
    }

    /// Load a persisted model into the registry. Returns whether one was found.
    pub fn restore(&self) -> Result<bool, StoreError> {
        let Some(store) = &self.model_store else {
            return Ok(false);
        };

        match store.load::<T::Model>()? {
            Some(model) => {
                let model = self.registry.install(model);
                info!(members = model.member_count(), "restored persisted model");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn run(&self, samples: usize) -> Result<TrainingReport, PricingError> {
        let dataset = SyntheticDataset::generate(samples, self.plan.seed)?;
        let model = self.registry.train(&dataset)?;
        self.persist(&*model, &dataset)?;

        Ok(TrainingReport {
            samples_trained: samples,
            metrics: model.metrics().cloned(),
        })
    }

    /// Train on the default plan unless a model is already served, and return the served
    /// model either way.
    pub fn warm_up(&self) -> Result<Arc<T::Model>, PricingError> {
        if let Some(model) = self.registry.snapshot() {
            return Ok(model);
        }

        let dataset = SyntheticDataset::generate(self.plan.samples, self.plan.seed)?;
        match self.registry.train_if_uninitialized(&dataset)? {
            Some(model) => {
                self.persist(&*model, &dataset)?;
                info!(samples = dataset.len(), "initial model trained");
                Ok(model)
            }
            None => self.registry.snapshot().ok_or(PricingError::ModelNotReady {
                state: ModelState::Uninitialized,
            }),
        }
    }

    /// Run `warm_up` on a worker thread. Returns false when a worker is already in flight
    /// or the thread could not be spawned.
    pub fn spawn_warm_up(self: &Arc<Self>) -> bool {
        if self
            .warming_up
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let pipeline = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("model-training".to_string())
            .spawn(move || {
                let _flag = TrainingFlag::adopt(&pipeline.warming_up);
                match pipeline.warm_up() {
                    Ok(model) => info!(
                        members = model.member_count(),
                        "background training finished"
                    ),
                    Err(err) => warn!(error = %err, "background training failed"),
                }
            });

        match spawned {
            Ok(_) => true,
            Err(err) => {
                self.warming_up.store(false, Ordering::Release);
                warn!(error = %err, "could not start background training");
                false
            }
        }
    }

    /// Whether a background warm-up worker has been claimed and not yet finished.
    pub fn is_warming_up(&self) -> bool {
        self.warming_up.load(Ordering::Acquire)
    }

    fn persist(&self, model: &T::Model, dataset: &Dataset) -> Result<(), PricingError> {
        if let Some(store) = &self.model_store {
            store.save(model)?;
        }
        if let Some(path) = &self.dataset_path {
            dataset.save_csv(path)?;
        }
        Ok(())
    }
}

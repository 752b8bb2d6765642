use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError};

use serde::Serialize;
use tracing::info;

use super::dataset::Dataset;
use super::{EnsembleRegressor, EnsembleTrainer, TrainingError};

/// Lifecycle of the served model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    Uninitialized,
    Training,
    Ready,
}

impl ModelState {
    pub fn label(&self) -> &'static str {
        match self {
            ModelState::Uninitialized => "uninitialized",
            ModelState::Training => "training",
            ModelState::Ready => "ready",
        }
    }
}

/// Holds the current model as an immutable snapshot. Readers clone the `Arc` and never
/// observe a partially trained model; at most one retrain runs at a time.
pub struct ModelRegistry<T: EnsembleTrainer> {
    trainer: T,
    current: RwLock<Option<Arc<T::Model>>>,
    training: AtomicBool,
    retrain_lock: Mutex<()>,
}

/// Clears an in-flight flag when dropped, including on early error returns.
pub(crate) struct TrainingFlag<'a>(&'a AtomicBool);

impl<'a> TrainingFlag<'a> {
    pub(crate) fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }

    /// Take over a flag the caller already set.
    pub(crate) fn adopt(flag: &'a AtomicBool) -> Self {
        Self(flag)
    }
}

impl Drop for TrainingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: EnsembleTrainer> ModelRegistry<T> {
    pub fn new(trainer: T) -> Self {
        Self {
            trainer,
            current: RwLock::new(None),
            training: AtomicBool::new(false),
            retrain_lock: Mutex::new(()),
        }
    }

    pub fn trainer(&self) -> &T {
        &self.trainer
    }

    pub fn state(&self) -> ModelState {
        if self.snapshot().is_some() {
            ModelState::Ready
        } else if self.is_training() {
            ModelState::Training
        } else {
            ModelState::Uninitialized
        }
    }

    pub fn is_training(&self) -> bool {
        self.training.load(Ordering::Acquire)
    }

    /// Current model, if one has been trained or installed.
    pub fn snapshot(&self) -> Option<Arc<T::Model>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Serve an already-trained model, e.g. one restored from disk.
    pub fn install(&self, model: T::Model) -> Arc<T::Model> {
        let model = Arc::new(model);
        self.swap(model.clone());
        model
    }

    /// Fit a new model and swap it in. Readers keep the previous snapshot meanwhile.
    pub fn train(&self, dataset: &Dataset) -> Result<Arc<T::Model>, TrainingError> {
        let _exclusive = self.exclusive()?;
        self.fit(dataset)
    }

    /// Fit only while no model is served. Returns `None` when a snapshot landed before the
    /// retrain lock was acquired, so a caller that lost a warm-up race never trains again.
    pub fn train_if_uninitialized(
        &self,
        dataset: &Dataset,
    ) -> Result<Option<Arc<T::Model>>, TrainingError> {
        let _exclusive = self.exclusive()?;
        if self.snapshot().is_some() {
            return Ok(None);
        }
        self.fit(dataset).map(Some)
    }

    fn exclusive(&self) -> Result<MutexGuard<'_, ()>, TrainingError> {
        match self.retrain_lock.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::WouldBlock) => Err(TrainingError::InProgress),
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
        }
    }

    fn fit(&self, dataset: &Dataset) -> Result<Arc<T::Model>, TrainingError> {
        let _flag = TrainingFlag::raise(&self.training);

        let model = Arc::new(self.trainer.train(dataset)?);
        self.swap(model.clone());
        info!(
            members = model.member_count(),
            samples = dataset.len(),
            "model snapshot swapped"
        );
        Ok(model)
    }

    fn swap(&self, model: Arc<T::Model>) {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *current = Some(model);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dataset::{Dataset, SyntheticDataset};
    use crate::model::features::PropertyFeatures;
    use serde::Deserialize;
    use std::collections::BTreeMap;
    use std::sync::mpsc;
    use std::thread;

    #[derive(Debug, Serialize, Deserialize)]
    struct ConstantModel {
        value: f64,
    }

    impl EnsembleRegressor for ConstantModel {
        fn is_trained(&self) -> bool {
            true
        }
        fn predict(&self, _features: &PropertyFeatures) -> f64 {
            self.value
        }
        fn predict_per_member(&self, _features: &PropertyFeatures) -> Vec<f64> {
            vec![self.value]
        }
        fn held_out_r_squared(&self) -> Option<f64> {
            None
        }
        fn feature_importances(&self) -> BTreeMap<String, f64> {
            BTreeMap::new()
        }
        fn feature_names(&self) -> Vec<String> {
            Vec::new()
        }
        fn member_count(&self) -> usize {
            1
        }
    }

    /// Trainer that blocks until released, so tests can observe an in-flight retrain.
    struct GatedTrainer {
        started: Mutex<Option<mpsc::Sender<()>>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl EnsembleTrainer for GatedTrainer {
        type Model = ConstantModel;

        fn train(&self, dataset: &Dataset) -> Result<ConstantModel, TrainingError> {
            if let Some(started) = self.started.lock().expect("lock").take() {
                started.send(()).expect("signal start");
            }
            self.release
                .lock()
                .expect("lock")
                .recv()
                .expect("release signal");
            Ok(ConstantModel {
                value: dataset.len() as f64,
            })
        }
    }

    struct InstantTrainer;

    impl EnsembleTrainer for InstantTrainer {
        type Model = ConstantModel;

        fn train(&self, dataset: &Dataset) -> Result<ConstantModel, TrainingError> {
            if dataset.is_empty() {
                return Err(TrainingError::EmptyDataset);
            }
            Ok(ConstantModel {
                value: dataset.len() as f64,
            })
        }
    }

    #[test]
    fn starts_uninitialized_and_becomes_ready() {
        let registry = ModelRegistry::new(InstantTrainer);
        assert_eq!(registry.state(), ModelState::Uninitialized);
        assert!(registry.snapshot().is_none());

        let dataset = SyntheticDataset::generate(10, 1).expect("dataset");
        let model = registry.train(&dataset).expect("training succeeds");

        assert_eq!(registry.state(), ModelState::Ready);
        assert_eq!(model.value, 10.0);
        assert!(!registry.is_training());
    }

    #[test]
    fn failed_training_leaves_previous_snapshot() {
        let registry = ModelRegistry::new(InstantTrainer);
        registry.install(ConstantModel { value: 3.0 });

        let err = registry
            .train(&Dataset::default())
            .expect_err("empty dataset rejected");
        assert_eq!(err, TrainingError::EmptyDataset);
        assert_eq!(registry.snapshot().expect("snapshot").value, 3.0);
        assert!(!registry.is_training());
    }

    #[test]
    fn warm_up_training_skips_an_installed_model() {
        let registry = ModelRegistry::new(InstantTrainer);
        let dataset = SyntheticDataset::generate(10, 1).expect("dataset");

        let first = registry
            .train_if_uninitialized(&dataset)
            .expect("training succeeds")
            .expect("trained while empty");
        assert_eq!(first.value, 10.0);

        let bigger = SyntheticDataset::generate(40, 1).expect("dataset");
        assert!(registry
            .train_if_uninitialized(&bigger)
            .expect("no error")
            .is_none());
        assert_eq!(registry.snapshot().expect("snapshot").value, 10.0);
        assert!(!registry.is_training());
    }

    #[test]
    fn concurrent_retrain_is_rejected_while_readers_keep_old_snapshot() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let registry = Arc::new(ModelRegistry::new(GatedTrainer {
            started: Mutex::new(Some(started_tx)),
            release: Mutex::new(release_rx),
        }));
        registry.install(ConstantModel { value: 1.0 });

        let background = {
            let registry = registry.clone();
            thread::spawn(move || {
                let dataset = SyntheticDataset::generate(25, 2).expect("dataset");
                registry.train(&dataset).map(|model| model.value)
            })
        };

        started_rx.recv().expect("training started");
        assert!(registry.is_training());
        assert_eq!(registry.state(), ModelState::Ready);
        assert_eq!(registry.snapshot().expect("old snapshot").value, 1.0);
        assert_eq!(
            registry.train(&Dataset::default()).map(|model| model.value),
            Err(TrainingError::InProgress)
        );

        release_tx.send(()).expect("release");
        let trained = background.join().expect("thread joins").expect("trained");
        assert_eq!(trained, 25.0);
        assert_eq!(registry.snapshot().expect("new snapshot").value, 25.0);
    }

    #[test]
    fn reports_training_state_before_first_model() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let registry = Arc::new(ModelRegistry::new(GatedTrainer {
            started: Mutex::new(Some(started_tx)),
            release: Mutex::new(release_rx),
        }));

        let background = {
            let registry = registry.clone();
            thread::spawn(move || registry.train(&Dataset::default()).is_ok())
        };

        started_rx.recv().expect("training started");
        assert_eq!(registry.state(), ModelState::Training);
        release_tx.send(()).expect("release");
        assert!(background.join().expect("thread joins"));
        assert_eq!(registry.state(), ModelState::Ready);
    }
}

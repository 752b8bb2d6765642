use metrics_exporter_prometheus::PrometheusHandle;
use rent_ai::config::AppConfig;
use rent_ai::error::AppError;
use rent_ai::geolocation::CityGeometry;
use rent_ai::model::{ForestTrainer, ModelRegistry, ModelStore};
use rent_ai::pricing::{PriceEstimator, PricingService, TrainingPipeline};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) type ForestPricingService = PricingService<ForestTrainer>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wire the forest-backed pricing service from configuration and restore any persisted model.
pub(crate) fn build_service(config: &AppConfig) -> Result<Arc<ForestPricingService>, AppError> {
    let city = Arc::new(CityGeometry::santa_cruz()?);

    let registry = ModelRegistry::new(ForestTrainer::new(config.model.forest));
    let pipeline = TrainingPipeline::new(registry, config.model.training_plan())
        .with_model_store(ModelStore::new(config.model.model_path.clone()))
        .with_dataset_path(config.model.dataset_path.clone());
    let pipeline = Arc::new(pipeline);

    match pipeline.restore() {
        Ok(true) => {}
        Ok(false) => info!(
            path = %config.model.model_path.display(),
            "no persisted model found"
        ),
        Err(err) => warn!(
            error = %err,
            path = %config.model.model_path.display(),
            "persisted model could not be loaded; it will be retrained"
        ),
    }

    Ok(Arc::new(PricingService::new(
        city,
        PriceEstimator::new(config.pricing.interval),
        pipeline,
        config.pricing.policy,
    )))
}

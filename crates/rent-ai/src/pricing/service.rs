use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::domain::{FinalEstimate, PropertyAttributes, TrainingReport};
use super::estimator::PriceEstimator;
use super::guard::PricingGuard;
use super::training::TrainingPipeline;
use crate::geolocation::{CityGeometry, GeoPoint, LocationAnalyzer, LocationProfile, Sector};
use crate::model::{
    EnsembleRegressor, EnsembleTrainer, ModelState, StoreError, TrainingError, TrainingMetrics,
};

/// Accepted sample counts for explicit training requests.
pub const TRAINING_SAMPLE_RANGE: std::ops::RangeInclusive<usize> = 100..=10_000;

/// What a prediction does when no model has been trained yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrainingPolicy {
    /// Fail with `ModelNotReady` and leave training to the caller.
    FailFast,
    /// Train synchronously on the default plan, then answer.
    OnDemand,
    /// Start training on a worker thread and fail with `ModelNotReady` meanwhile.
    Background,
}

impl TrainingPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "fail_fast" | "fail" => Some(Self::FailFast),
            "on-demand" | "on_demand" | "sync" => Some(Self::OnDemand),
            "background" | "async" => Some(Self::Background),
            _ => None,
        }
    }
}

/// Errors surfaced by the pricing service, one kind per caller reaction.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("model is not ready (state: {})", .state.label())]
    ModelNotReady { state: ModelState },
    #[error("coordinates ({lat}, {lon}) are outside the serviceable area")]
    InvalidCoordinate { lat: f64, lon: f64 },
    #[error("invalid property attributes: {0}")]
    InvalidAttributes(String),
    #[error("price computation failed: {0}")]
    Computation(String),
    #[error(transparent)]
    Training(#[from] TrainingError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Entry point composing validation, location analysis, and price estimation.
pub struct PricingService<T: EnsembleTrainer> {
    guard: PricingGuard,
    analyzer: LocationAnalyzer,
    estimator: PriceEstimator,
    pipeline: Arc<TrainingPipeline<T>>,
    policy: TrainingPolicy,
}

impl<T> PricingService<T>
where
    T: EnsembleTrainer + 'static,
{
    pub fn new(
        city: Arc<CityGeometry>,
        estimator: PriceEstimator,
        pipeline: Arc<TrainingPipeline<T>>,
        policy: TrainingPolicy,
    ) -> Self {
        Self {
            guard: PricingGuard::new(city.service_area),
            analyzer: LocationAnalyzer::new(city),
            estimator,
            pipeline,
            policy,
        }
    }

    pub fn policy(&self) -> TrainingPolicy {
        self.policy
    }

    pub fn pipeline(&self) -> &Arc<TrainingPipeline<T>> {
        &self.pipeline
    }

    /// Classify a point inside the service area without pricing it.
    pub fn locate(&self, point: GeoPoint) -> Result<LocationProfile, PricingError> {
        self.guard.check_point(point)?;
        Ok(self.analyzer.analyze(point))
    }

    pub fn predict(
        &self,
        attributes: &PropertyAttributes,
        point: GeoPoint,
    ) -> Result<FinalEstimate, PricingError> {
        self.guard.check(attributes, point)?;

        let profile = self.analyzer.analyze(point);
        let features = attributes.features(&profile);
        let model = self.ready_model()?;

        let mut estimate = self.estimator.estimate(&features, &*model)?;
        if profile.price_multiplier != 1.0 {
            estimate = self.estimator.apply_multiplier(estimate, profile.price_multiplier);
        }

        debug!(
            ring = profile.ring,
            zone_code = profile.zone_code,
            suggested = estimate.suggested,
            "price estimated"
        );

        Ok(FinalEstimate {
            estimate,
            ring: profile.ring,
            ring_label: profile.ring_label,
            distance_km: profile.distance_km,
            special_zone_name: profile.special_zone_name,
            zone_code: profile.zone_code,
            price_multiplier: profile.price_multiplier,
        })
    }

    /// Train a fresh model on `samples` synthetic listings and swap it in.
    pub fn retrain(&self, samples: usize) -> Result<TrainingReport, PricingError> {
        if !TRAINING_SAMPLE_RANGE.contains(&samples) {
            return Err(PricingError::InvalidAttributes(format!(
                "n_samples must be between {} and {}, got {samples}",
                TRAINING_SAMPLE_RANGE.start(),
                TRAINING_SAMPLE_RANGE.end()
            )));
        }

        info!(samples, "retraining requested");
        self.pipeline.run(samples)
    }

    pub fn status(&self) -> ServiceStatus {
        let registry = self.pipeline.registry();
        let state = match registry.state() {
            ModelState::Uninitialized if self.pipeline.is_warming_up() => ModelState::Training,
            state => state,
        };
        let model = registry.snapshot();
        let city = self.analyzer.city();

        ServiceStatus {
            service: "rent-ai pricing",
            status: match state {
                ModelState::Ready => "operational",
                ModelState::Training => "training",
                ModelState::Uninitialized => "requires_training",
            },
            training_policy: self.policy,
            model: ModelStatus {
                state,
                retraining: state == ModelState::Ready && registry.is_training(),
                n_estimators: model.as_ref().map(|model| model.member_count()),
                max_depth: model.as_ref().and_then(|model| model.max_depth()),
                features: model
                    .as_ref()
                    .map(|model| model.feature_names())
                    .unwrap_or_default(),
                metrics: model.as_ref().and_then(|model| model.metrics().cloned()),
            },
            geolocation: GeolocationStatus {
                center: city.center,
                rings_per_sector: city.radii.rings_per_sector(),
                special_zones: city.zone_names(),
            },
        }
    }

    fn ready_model(&self) -> Result<Arc<T::Model>, PricingError> {
        let registry = self.pipeline.registry();
        if let Some(model) = registry.snapshot() {
            return Ok(model);
        }

        match self.policy {
            TrainingPolicy::FailFast => Err(PricingError::ModelNotReady {
                state: registry.state(),
            }),
            TrainingPolicy::OnDemand => {
                info!("no trained model; training on demand");
                match self.pipeline.warm_up() {
                    Err(PricingError::Training(TrainingError::InProgress)) => {
                        Err(PricingError::ModelNotReady {
                            state: ModelState::Training,
                        })
                    }
                    other => other,
                }
            }
            TrainingPolicy::Background => {
                if self.pipeline.spawn_warm_up() {
                    info!("no trained model; background training started");
                }
                Err(PricingError::ModelNotReady {
                    state: ModelState::Training,
                })
            }
        }
    }
}

/// Operational snapshot for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub service: &'static str,
    pub status: &'static str,
    pub training_policy: TrainingPolicy,
    pub model: ModelStatus,
    pub geolocation: GeolocationStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub state: ModelState,
    pub retraining: bool,
    pub n_estimators: Option<usize>,
    pub max_depth: Option<usize>,
    pub features: Vec<String>,
    pub metrics: Option<TrainingMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeolocationStatus {
    pub center: GeoPoint,
    pub rings_per_sector: BTreeMap<Sector, usize>,
    pub special_zones: Vec<String>,
}

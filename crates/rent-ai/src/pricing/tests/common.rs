use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geolocation::{CityGeometry, GeoPoint};
use crate::model::{
    Dataset, EnsembleRegressor, EnsembleTrainer, ModelRegistry, PropertyFeatures, TrainingError,
};
use crate::pricing::{
    PriceEstimator, PricingService, PropertyAttributes, TrainingPipeline, TrainingPlan,
    TrainingPolicy,
};

/// Inside the Equipetrol box, north-west of the center.
pub(super) const EQUIPETROL: GeoPoint = GeoPoint::new(-17.768, -63.194);
pub(super) const CITY_CENTER: GeoPoint = GeoPoint::new(-17.783929, -63.180793);
pub(super) const LA_PAZ: GeoPoint = GeoPoint::new(-16.5, -68.15);

/// Ensemble whose members always answer with fixed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(super) struct FixedModel {
    pub members: Vec<f64>,
    pub r2: Option<f64>,
}

impl FixedModel {
    pub(super) fn new(members: Vec<f64>, r2: Option<f64>) -> Self {
        Self { members, r2 }
    }
}

impl EnsembleRegressor for FixedModel {
    fn is_trained(&self) -> bool {
        !self.members.is_empty()
    }

    fn predict(&self, _features: &PropertyFeatures) -> f64 {
        self.members.iter().sum::<f64>() / self.members.len() as f64
    }

    fn predict_per_member(&self, _features: &PropertyFeatures) -> Vec<f64> {
        self.members.clone()
    }

    fn held_out_r_squared(&self) -> Option<f64> {
        self.r2
    }

    fn feature_importances(&self) -> BTreeMap<String, f64> {
        BTreeMap::new()
    }

    fn feature_names(&self) -> Vec<String> {
        vec!["zona_id".to_string()]
    }

    fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// Hands out a clone of a prepared model and counts how often it was asked to.
#[derive(Debug, Clone)]
pub(super) struct FixedTrainer {
    model: FixedModel,
    runs: Arc<AtomicUsize>,
}

impl FixedTrainer {
    pub(super) fn new(model: FixedModel) -> Self {
        Self {
            model,
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(super) fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl EnsembleTrainer for FixedTrainer {
    type Model = FixedModel;

    fn train(&self, dataset: &Dataset) -> Result<FixedModel, TrainingError> {
        if dataset.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(self.model.clone())
    }
}

pub(super) fn spread_model() -> FixedModel {
    FixedModel::new(vec![0.08, 0.1, 0.12], Some(0.91234))
}

pub(super) fn attributes() -> PropertyAttributes {
    PropertyAttributes {
        area_m2: 120.0,
        bedrooms: 3,
        bathrooms: 2,
        has_parking: true,
        has_pool: false,
    }
}

pub(super) fn city() -> Arc<CityGeometry> {
    Arc::new(CityGeometry::santa_cruz().expect("built-in geometry is valid"))
}

pub(super) fn build_service(
    model: FixedModel,
    policy: TrainingPolicy,
) -> PricingService<FixedTrainer> {
    let pipeline = TrainingPipeline::new(
        ModelRegistry::new(FixedTrainer::new(model)),
        TrainingPlan {
            samples: 120,
            seed: 7,
        },
    );
    PricingService::new(
        city(),
        PriceEstimator::default(),
        Arc::new(pipeline),
        policy,
    )
}

/// Service with `model` already installed, so no training policy ever triggers.
pub(super) fn ready_service(model: FixedModel) -> PricingService<FixedTrainer> {
    let service = build_service(model.clone(), TrainingPolicy::FailFast);
    service.pipeline().registry().install(model);
    service
}

pub(super) fn trainer_runs(service: &PricingService<FixedTrainer>) -> usize {
    service.pipeline().registry().trainer().runs()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&body).expect("valid json body")
}

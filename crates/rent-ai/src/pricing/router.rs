use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::domain::{FinalEstimate, PropertyAttributes};
use super::service::{PricingError, PricingService};
use super::training::TrainingPlan;
use crate::geolocation::{GeoPoint, LocationProfile, Sector};
use crate::model::{EnsembleTrainer, TrainingError};

/// Router exposing prediction, location lookup, status, and training endpoints.
pub fn pricing_router<T>(service: Arc<PricingService<T>>) -> Router
where
    T: EnsembleTrainer + 'static,
{
    Router::new()
        .route("/predict", post(predict_handler::<T>))
        .route("/location", get(location_handler::<T>))
        .route("/status", get(status_handler::<T>))
        .route("/train", post(train_handler::<T>))
        .with_state(service)
}

/// Prediction payload. Flags arrive as 0/1 integers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub metros: f64,
    pub cuartos: u8,
    pub banos: u8,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub parking: u8,
    #[serde(default)]
    pub piscina: u8,
}

impl PredictRequest {
    fn into_parts(self) -> Result<(PropertyAttributes, GeoPoint), PricingError> {
        let attributes = PropertyAttributes {
            area_m2: self.metros,
            bedrooms: self.cuartos,
            bathrooms: self.banos,
            has_parking: flag("parking", self.parking)?,
            has_pool: flag("piscina", self.piscina)?,
        };
        Ok((attributes, GeoPoint::new(self.lat, self.lon)))
    }
}

fn flag(name: &str, value: u8) -> Result<bool, PricingError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(PricingError::InvalidAttributes(format!(
            "{name} must be 0 or 1, got {other}"
        ))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub precio_sugerido: f64,
    pub precio_min: f64,
    pub precio_max: f64,
    pub confianza: f64,
    pub anillo: u8,
    pub anillo_descripcion: String,
    pub distancia_centro_km: f64,
    pub zona_especial: Option<String>,
}

impl From<FinalEstimate> for PredictResponse {
    fn from(value: FinalEstimate) -> Self {
        Self {
            precio_sugerido: value.estimate.suggested,
            precio_min: value.estimate.min,
            precio_max: value.estimate.max,
            confianza: value.estimate.confidence,
            anillo: value.ring,
            anillo_descripcion: value.ring_label,
            distancia_centro_km: value.distance_km,
            zona_especial: value.special_zone_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationResponse {
    pub lat: f64,
    pub lon: f64,
    pub anillo: u8,
    pub anillo_descripcion: String,
    pub distancia_centro_km: f64,
    pub sector: Sector,
    pub zona_especial: Option<String>,
    pub zona_id: u16,
    pub multiplicador: f64,
}

impl LocationResponse {
    fn new(point: GeoPoint, profile: LocationProfile) -> Self {
        Self {
            lat: point.lat,
            lon: point.lon,
            anillo: profile.ring,
            anillo_descripcion: profile.ring_label,
            distancia_centro_km: profile.distance_km,
            sector: profile.sector,
            zona_especial: profile.special_zone_name,
            zona_id: profile.zone_code,
            multiplicador: profile.price_multiplier,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TrainQuery {
    pub n_samples: Option<usize>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LocationQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize)]
struct Envelope<D> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<D>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn success<D: Serialize>(data: D) -> Response {
    let body = Envelope {
        success: true,
        data: Some(data),
        error: None,
    };
    (StatusCode::OK, Json(body)).into_response()
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let body: Envelope<()> = Envelope {
        success: false,
        data: None,
        error: Some(message.into()),
    };
    (status, Json(body)).into_response()
}

fn status_for(err: &PricingError) -> StatusCode {
    match err {
        PricingError::InvalidCoordinate { .. } | PricingError::InvalidAttributes(_) => {
            StatusCode::BAD_REQUEST
        }
        PricingError::ModelNotReady { .. } => StatusCode::SERVICE_UNAVAILABLE,
        PricingError::Training(TrainingError::InProgress) => StatusCode::CONFLICT,
        PricingError::Computation(_) | PricingError::Training(_) | PricingError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: PricingError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
        error!(error = %err, "pricing request failed");
    } else {
        warn!(error = %err, "pricing request rejected");
    }
    failure(status, err.to_string())
}

fn worker_failure(err: tokio::task::JoinError) -> Response {
    error!(error = %err, "pricing worker panicked or was cancelled");
    failure(StatusCode::INTERNAL_SERVER_ERROR, "pricing worker failed")
}

pub(crate) async fn predict_handler<T>(
    State(service): State<Arc<PricingService<T>>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Response
where
    T: EnsembleTrainer + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return failure(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    let (attributes, point) = match request.into_parts() {
        Ok(parts) => parts,
        Err(err) => return error_response(err),
    };

    let outcome =
        tokio::task::spawn_blocking(move || service.predict(&attributes, point)).await;
    match outcome {
        Ok(Ok(estimate)) => success(PredictResponse::from(estimate)),
        Ok(Err(err)) => error_response(err),
        Err(join) => worker_failure(join),
    }
}

pub(crate) async fn location_handler<T>(
    State(service): State<Arc<PricingService<T>>>,
    query: Result<Query<LocationQuery>, QueryRejection>,
) -> Response
where
    T: EnsembleTrainer + 'static,
{
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return failure(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let point = GeoPoint::new(query.lat, query.lon);
    match service.locate(point) {
        Ok(profile) => success(LocationResponse::new(point, profile)),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<T>(State(service): State<Arc<PricingService<T>>>) -> Response
where
    T: EnsembleTrainer + 'static,
{
    success(service.status())
}

pub(crate) async fn train_handler<T>(
    State(service): State<Arc<PricingService<T>>>,
    query: Result<Query<TrainQuery>, QueryRejection>,
) -> Response
where
    T: EnsembleTrainer + 'static,
{
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return failure(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    let samples = query
        .n_samples
        .unwrap_or_else(|| TrainingPlan::default().samples);

    match tokio::task::spawn_blocking(move || service.retrain(samples)).await {
        Ok(Ok(report)) => success(report),
        Ok(Err(err)) => error_response(err),
        Err(join) => worker_failure(join),
    }
}

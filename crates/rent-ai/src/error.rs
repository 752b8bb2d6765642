use crate::config::ConfigError;
use crate::geolocation::GeometryError;
use crate::model::{StoreError, TrainingError};
use crate::pricing::PricingError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Geometry(GeometryError),
    Store(StoreError),
    Pricing(PricingError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Geometry(err) => write!(f, "city geometry error: {}", err),
            AppError::Store(err) => write!(f, "storage error: {}", err),
            AppError::Pricing(err) => write!(f, "pricing error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Geometry(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Pricing(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Pricing(
                PricingError::InvalidCoordinate { .. } | PricingError::InvalidAttributes(_),
            ) => StatusCode::BAD_REQUEST,
            AppError::Pricing(PricingError::ModelNotReady { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Pricing(PricingError::Training(TrainingError::InProgress)) => {
                StatusCode::CONFLICT
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Geometry(_)
            | AppError::Store(_)
            | AppError::Pricing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "success": false, "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<GeometryError> for AppError {
    fn from(value: GeometryError) -> Self {
        Self::Geometry(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<PricingError> for AppError {
    fn from(value: PricingError) -> Self {
        Self::Pricing(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelState;

    #[test]
    fn pricing_errors_map_to_caller_facing_statuses() {
        let cases = [
            (
                AppError::from(PricingError::InvalidCoordinate {
                    lat: 0.0,
                    lon: 0.0,
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(PricingError::ModelNotReady {
                    state: ModelState::Uninitialized,
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::from(PricingError::Training(TrainingError::InProgress)),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(PricingError::Computation("nan".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::from(ConfigError::InvalidPort),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}

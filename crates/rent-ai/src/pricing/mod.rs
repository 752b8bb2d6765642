//! Rental price estimation: request validation, ensemble-spread intervals, zone
//! multipliers, and the training lifecycle behind the prediction entry point.

pub mod domain;
pub mod estimator;
pub(crate) mod guard;
pub mod router;
pub mod service;
pub mod training;

#[cfg(test)]
mod tests;

pub use domain::{FinalEstimate, PriceEstimate, PropertyAttributes, TrainingReport};
pub use estimator::{
    IntervalConfig, PriceEstimator, DEFAULT_FALLBACK_CONFIDENCE, DEFAULT_INTERVAL_SIGMA,
    DEFAULT_PRICE_FLOOR,
};
pub use guard::PricingGuard;
pub use router::{pricing_router, LocationResponse, PredictRequest, PredictResponse};
pub use service::{
    GeolocationStatus, ModelStatus, PricingError, PricingService, ServiceStatus, TrainingPolicy,
    TRAINING_SAMPLE_RANGE,
};
pub use training::{TrainingPipeline, TrainingPlan};

//! Rental price estimation for Santa Cruz de la Sierra.
//!
//! A coordinate is classified into a concentric ring and, where applicable, a premium
//! zone; the resulting zone code feeds an ensemble regressor whose member spread yields
//! the price band.

pub mod config;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod pricing;
pub mod rounding;
pub mod telemetry;

pub use config::AppConfig;
pub use error::AppError;
pub use geolocation::{GeoPoint, LocationAnalyzer, LocationProfile};
pub use pricing::{FinalEstimate, PricingError, PricingService, PropertyAttributes};

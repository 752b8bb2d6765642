use serde::{Deserialize, Serialize};

use crate::geolocation::LocationProfile;
use crate::model::{PropertyFeatures, TrainingMetrics};

/// Physical attributes of a listing as supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyAttributes {
    pub area_m2: f64,
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub has_parking: bool,
    pub has_pool: bool,
}

impl PropertyAttributes {
    /// Feature vector for the regressor; location enters only through the zone code.
    pub fn features(&self, location: &LocationProfile) -> PropertyFeatures {
        PropertyFeatures {
            area_m2: self.area_m2,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            zone_code: location.zone_code,
            has_parking: self.has_parking,
            has_pool: self.has_pool,
        }
    }
}

/// Point estimate with its uncertainty band. `min <= suggested <= max` and `min > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceEstimate {
    pub suggested: f64,
    pub min: f64,
    pub max: f64,
    pub confidence: f64,
}

/// Response of the prediction entry point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalEstimate {
    pub estimate: PriceEstimate,
    pub ring: u8,
    pub ring_label: String,
    pub distance_km: f64,
    pub special_zone_name: Option<String>,
    pub zone_code: u16,
    pub price_multiplier: f64,
}

/// Outcome of an explicit (re)training request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub samples_trained: usize,
    pub metrics: Option<TrainingMetrics>,
}

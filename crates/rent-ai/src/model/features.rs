use serde::{Deserialize, Serialize};

/// Column names of the feature vector, in model order.
pub const FEATURE_NAMES: [&str; 6] = [
    "metros_cuadrados",
    "num_habitacion",
    "num_banos",
    "zona_id",
    "parking",
    "piscina",
];

pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Order-fixed input vector for the ensemble regressor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyFeatures {
    pub area_m2: f64,
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub zone_code: u16,
    pub has_parking: bool,
    pub has_pool: bool,
}

impl PropertyFeatures {
    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.area_m2,
            f64::from(self.bedrooms),
            f64::from(self.bathrooms),
            f64::from(self.zone_code),
            if self.has_parking { 1.0 } else { 0.0 },
            if self.has_pool { 1.0 } else { 0.0 },
        ]
    }
}

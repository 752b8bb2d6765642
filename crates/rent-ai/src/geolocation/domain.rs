use serde::{Deserialize, Serialize};
use std::fmt;

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when both components are finite and inside the WGS84 ranges.
    pub fn is_well_formed(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Cardinal sector used to pick the ring radius table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    North,
    South,
    East,
    West,
}

impl Sector {
    pub const ALL: [Sector; 4] = [Sector::North, Sector::South, Sector::East, Sector::West];

    /// Position in `Sector::ALL`.
    pub const fn index(self) -> usize {
        match self {
            Sector::North => 0,
            Sector::South => 1,
            Sector::East => 2,
            Sector::West => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sector::North => "north",
            Sector::South => "south",
            Sector::East => "east",
            Sector::West => "west",
        }
    }
}

/// Axis-aligned box with inclusive edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.lat_min..=self.lat_max).contains(&point.lat)
            && (self.lon_min..=self.lon_max).contains(&point.lon)
    }
}

/// Named premium district overriding ring classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialZone {
    pub name: String,
    pub bounding_box: BoundingBox,
    pub zone_code: u16,
    pub price_multiplier: f64,
}

/// Per-request classification of a point against the city geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationProfile {
    pub ring: u8,
    pub ring_label: String,
    pub distance_km: f64,
    pub sector: Sector,
    pub special_zone_name: Option<String>,
    pub zone_code: u16,
    pub price_multiplier: f64,
}

impl LocationProfile {
    pub fn has_special_zone(&self) -> bool {
        self.special_zone_name.is_some()
    }
}

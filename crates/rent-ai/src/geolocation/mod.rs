//! Ring and premium-zone classification of coordinates around a fixed city center.

pub mod analyzer;
pub mod city;
pub mod distance;
pub mod domain;
pub mod zones;

pub use analyzer::LocationAnalyzer;
pub use city::{CityGeometry, SANTA_CRUZ_CENTER, SANTA_CRUZ_SERVICE_AREA};
pub use distance::distance_km;
pub use domain::{BoundingBox, GeoPoint, LocationProfile, Sector, SpecialZone};
pub use zones::{
    ring, ring_label, sector, special_zone, GeometryError, SectorRadiusTable, RING_COUNT,
    URBAN_CORE_RADIUS_KM,
};

use geo::{Distance, Geodesic, Point};

use super::domain::GeoPoint;
use crate::rounding::round_to;

/// Geodesic (WGS84 ellipsoid) distance in kilometers, rounded to two decimals.
pub fn distance_km(center: GeoPoint, point: GeoPoint) -> f64 {
    let origin = Point::new(center.lon, center.lat);
    let destination = Point::new(point.lon, point.lat);
    let meters = Geodesic::distance(origin, destination);
    round_to(meters / 1000.0, 2)
}

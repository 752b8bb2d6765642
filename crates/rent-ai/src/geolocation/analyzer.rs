use std::sync::Arc;

use tracing::debug;

use super::city::CityGeometry;
use super::distance::distance_km;
use super::domain::{GeoPoint, LocationProfile};
use super::zones::{ring, ring_label, sector, special_zone};

/// Composes distance, sector, ring and special-zone classification for one city.
#[derive(Debug, Clone)]
pub struct LocationAnalyzer {
    city: Arc<CityGeometry>,
}

impl LocationAnalyzer {
    pub fn new(city: Arc<CityGeometry>) -> Self {
        Self { city }
    }

    pub fn city(&self) -> &CityGeometry {
        &self.city
    }

    /// Classify a point. Range checks against the service area are the caller's job.
    pub fn analyze(&self, point: GeoPoint) -> LocationProfile {
        let center = self.city.center;
        let distance = distance_km(center, point);
        let sector = sector(center, point);
        let ring = ring(distance, sector, &self.city.radii);

        let (special_zone_name, zone_code, price_multiplier) =
            match special_zone(point, &self.city.special_zones) {
                Some(zone) => (
                    Some(zone.name.clone()),
                    zone.zone_code,
                    zone.price_multiplier,
                ),
                None => (None, u16::from(ring), 1.0),
            };

        debug!(
            %point,
            distance_km = distance,
            ?sector,
            ring,
            zone_code,
            "classified location"
        );

        LocationProfile {
            ring,
            ring_label: ring_label(ring),
            distance_km: distance,
            sector,
            special_zone_name,
            zone_code,
            price_multiplier,
        }
    }
}

use std::collections::BTreeSet;

use serde::Serialize;

use super::domain::{BoundingBox, GeoPoint, SpecialZone};
use super::zones::{GeometryError, SectorRadiusTable, RING_COUNT};

/// Center of Santa Cruz de la Sierra (plaza 24 de Septiembre).
pub const SANTA_CRUZ_CENTER: GeoPoint = GeoPoint::new(-17.783929, -63.180793);

/// Region accepted by the pricing service; points outside are rejected upstream.
pub const SANTA_CRUZ_SERVICE_AREA: BoundingBox = BoundingBox {
    lat_min: -18.0,
    lat_max: -17.5,
    lon_min: -63.5,
    lon_max: -62.5,
};

// Measured ring radii in km. The rings are not circles, so each sector has its own table.
const NORTH_RADII: [f64; 10] = [1.26, 2.10, 3.24, 4.37, 5.39, 6.32, 7.37, 8.43, 9.48, 10.53];
const SOUTH_RADII: [f64; 10] = [1.28, 2.29, 3.61, 4.91, 5.89, 7.28, 8.49, 9.71, 10.92, 12.13];
const EAST_RADII: [f64; 10] = [1.32, 2.23, 3.15, 3.93, 5.39, 6.49, 7.57, 8.65, 9.73, 10.82];
const WEST_RADII: [f64; 10] = [1.20, 2.02, 3.15, 4.16, 5.19, 6.25, 7.29, 8.33, 9.38, 10.42];

/// Immutable geometry for one metropolitan area: center, ring tables and premium zones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityGeometry {
    pub center: GeoPoint,
    pub service_area: BoundingBox,
    pub radii: SectorRadiusTable,
    pub special_zones: Vec<SpecialZone>,
}

impl CityGeometry {
    pub fn new(
        center: GeoPoint,
        service_area: BoundingBox,
        radii: SectorRadiusTable,
        special_zones: Vec<SpecialZone>,
    ) -> Result<Self, GeometryError> {
        let mut names = BTreeSet::new();
        let mut codes = BTreeSet::new();

        for zone in &special_zones {
            let invalid = |reason: &str| GeometryError::InvalidZone {
                name: zone.name.clone(),
                reason: reason.to_string(),
            };

            if !names.insert(zone.name.as_str()) {
                return Err(invalid("duplicate name"));
            }
            if !codes.insert(zone.zone_code) {
                return Err(invalid("duplicate zone code"));
            }
            if zone.zone_code <= u16::from(RING_COUNT) {
                return Err(invalid("zone code collides with ring codes 0-10"));
            }
            if !(zone.price_multiplier.is_finite() && zone.price_multiplier > 0.0) {
                return Err(invalid("price multiplier must be positive"));
            }
            let bbox = zone.bounding_box;
            if bbox.lat_min > bbox.lat_max || bbox.lon_min > bbox.lon_max {
                return Err(invalid("bounding box minimum exceeds maximum"));
            }
        }

        Ok(Self {
            center,
            service_area,
            radii,
            special_zones,
        })
    }

    /// Santa Cruz de la Sierra, Bolivia.
    pub fn santa_cruz() -> Result<Self, GeometryError> {
        let radii = SectorRadiusTable::new(NORTH_RADII, SOUTH_RADII, EAST_RADII, WEST_RADII)?;

        let special_zones = vec![
            SpecialZone {
                name: "Equipetrol".to_string(),
                bounding_box: BoundingBox {
                    lat_min: -17.774,
                    lat_max: -17.762,
                    lon_min: -63.200,
                    lon_max: -63.188,
                },
                zone_code: 101,
                price_multiplier: 1.5,
            },
            SpecialZone {
                name: "Urubo".to_string(),
                bounding_box: BoundingBox {
                    lat_min: -17.68,
                    lat_max: -17.65,
                    lon_min: -63.25,
                    lon_max: -63.22,
                },
                zone_code: 102,
                price_multiplier: 1.3,
            },
            SpecialZone {
                name: "Norte".to_string(),
                bounding_box: BoundingBox {
                    lat_min: -17.76,
                    lat_max: -17.74,
                    lon_min: -63.20,
                    lon_max: -63.17,
                },
                zone_code: 103,
                price_multiplier: 1.2,
            },
        ];

        Self::new(
            SANTA_CRUZ_CENTER,
            SANTA_CRUZ_SERVICE_AREA,
            radii,
            special_zones,
        )
    }

    pub fn zone_names(&self) -> Vec<String> {
        self.special_zones
            .iter()
            .map(|zone| zone.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn santa_cruz_geometry_is_valid() {
        let city = CityGeometry::santa_cruz().expect("builtin geometry");
        assert_eq!(city.center, SANTA_CRUZ_CENTER);
        assert_eq!(city.zone_names(), vec!["Equipetrol", "Urubo", "Norte"]);
        assert!(city.radii.rings_per_sector().values().all(|count| *count == 10));
    }

    #[test]
    fn rejects_zone_codes_inside_ring_range() {
        let city = CityGeometry::santa_cruz().expect("builtin geometry");
        let mut zones = city.special_zones.clone();
        zones[0].zone_code = 7;

        let err = CityGeometry::new(city.center, city.service_area, city.radii, zones)
            .expect_err("ring code collision rejected");
        assert!(matches!(err, GeometryError::InvalidZone { .. }));
    }

    #[test]
    fn rejects_duplicate_zone_names() {
        let city = CityGeometry::santa_cruz().expect("builtin geometry");
        let mut zones = city.special_zones.clone();
        zones[1].name = "Equipetrol".to_string();

        let err = CityGeometry::new(city.center, city.service_area, city.radii, zones)
            .expect_err("duplicate name rejected");
        assert!(err.to_string().contains("duplicate name"));
    }
}

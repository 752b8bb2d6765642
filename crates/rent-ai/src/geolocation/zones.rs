use std::collections::BTreeMap;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::domain::{GeoPoint, Sector, SpecialZone};

/// Number of tabulated rings per sector.
pub const RING_COUNT: u8 = 10;

/// Distances below this radius belong to the sector-independent center ring.
pub const URBAN_CORE_RADIUS_KM: f64 = 1.0;

/// Construction errors for the static city geometry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("radius table for {sector:?} is not strictly increasing at ring {ring}")]
    NonMonotonic { sector: Sector, ring: u8 },
    #[error("radius table for {sector:?} contains a non-positive or non-finite radius")]
    InvalidRadius { sector: Sector },
    #[error("special zone '{name}' is invalid: {reason}")]
    InvalidZone { name: String, reason: String },
}

type RadiusRow = [f64; RING_COUNT as usize];

/// Outer radius (km) of rings 1..=10 for each cardinal sector, indexed by `Sector::index`.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorRadiusTable {
    radii: [RadiusRow; 4],
}

impl SectorRadiusTable {
    pub fn new(
        north: RadiusRow,
        south: RadiusRow,
        east: RadiusRow,
        west: RadiusRow,
    ) -> Result<Self, GeometryError> {
        let table = Self {
            radii: [north, south, east, west],
        };

        for sector in Sector::ALL {
            let row = table.radii(sector);
            if row.iter().any(|radius| !radius.is_finite() || *radius <= 0.0) {
                return Err(GeometryError::InvalidRadius { sector });
            }
            if let Some(position) = row.windows(2).position(|pair| pair[1] <= pair[0]) {
                return Err(GeometryError::NonMonotonic {
                    sector,
                    ring: position as u8 + 2,
                });
            }
        }

        Ok(table)
    }

    pub fn radii(&self, sector: Sector) -> &RadiusRow {
        &self.radii[sector.index()]
    }

    pub fn rings_per_sector(&self) -> BTreeMap<Sector, usize> {
        Sector::ALL
            .into_iter()
            .map(|sector| (sector, self.radii(sector).len()))
            .collect()
    }
}

impl Serialize for SectorRadiusTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.radii.len()))?;
        for sector in Sector::ALL {
            map.serialize_entry(&sector, self.radii(sector))?;
        }
        map.end()
    }
}

/// Cardinal sector of `point` relative to `center`, chosen by the axis with the larger
/// angular deviation. Ties fall through to the longitude axis.
pub fn sector(center: GeoPoint, point: GeoPoint) -> Sector {
    let dlat = point.lat - center.lat;
    let dlon = point.lon - center.lon;

    if dlat.abs() > dlon.abs() {
        if dlat > 0.0 {
            Sector::North
        } else {
            Sector::South
        }
    } else if dlon > 0.0 {
        Sector::East
    } else {
        Sector::West
    }
}

/// Ring index in `0..=10`. Boundaries are inclusive and anything past the last radius
/// clamps to the outermost ring.
pub fn ring(distance_km: f64, sector: Sector, table: &SectorRadiusTable) -> u8 {
    if distance_km < URBAN_CORE_RADIUS_KM {
        return 0;
    }

    table
        .radii(sector)
        .iter()
        .position(|radius| distance_km <= *radius)
        .map(|index| index as u8 + 1)
        .unwrap_or(RING_COUNT)
}

/// First zone, in declared order, whose box contains the point.
pub fn special_zone(point: GeoPoint, zones: &[SpecialZone]) -> Option<&SpecialZone> {
    zones.iter().find(|zone| zone.bounding_box.contains(point))
}

pub fn ring_label(ring: u8) -> String {
    match ring {
        0 => "Centro".to_string(),
        1 => "1er Anillo".to_string(),
        2 => "2do Anillo".to_string(),
        3 => "3er Anillo".to_string(),
        4 => "4to Anillo".to_string(),
        5 => "5to Anillo".to_string(),
        6 => "6to Anillo".to_string(),
        7 => "7mo Anillo".to_string(),
        8 => "8vo Anillo".to_string(),
        9 => "9no Anillo".to_string(),
        10 => "10mo Anillo".to_string(),
        other => format!("{other}to Anillo"),
    }
}

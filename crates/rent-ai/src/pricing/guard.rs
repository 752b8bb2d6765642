use super::domain::PropertyAttributes;
use super::service::PricingError;
use crate::geolocation::{BoundingBox, GeoPoint};

const MAX_AREA_M2: f64 = 1000.0;
const BEDROOM_RANGE: std::ops::RangeInclusive<u8> = 1..=20;
const BATHROOM_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

/// Rejects inputs before any classification or model work happens.
#[derive(Debug, Clone)]
pub struct PricingGuard {
    service_area: BoundingBox,
}

impl PricingGuard {
    pub fn new(service_area: BoundingBox) -> Self {
        Self { service_area }
    }

    pub fn check_point(&self, point: GeoPoint) -> Result<(), PricingError> {
        if point.is_well_formed() && self.service_area.contains(point) {
            Ok(())
        } else {
            Err(PricingError::InvalidCoordinate {
                lat: point.lat,
                lon: point.lon,
            })
        }
    }

    pub fn check_attributes(&self, attributes: &PropertyAttributes) -> Result<(), PricingError> {
        if !attributes.area_m2.is_finite()
            || attributes.area_m2 <= 0.0
            || attributes.area_m2 > MAX_AREA_M2
        {
            return Err(PricingError::InvalidAttributes(format!(
                "area_m2 must be in (0, {MAX_AREA_M2}], got {}",
                attributes.area_m2
            )));
        }
        if !BEDROOM_RANGE.contains(&attributes.bedrooms) {
            return Err(PricingError::InvalidAttributes(format!(
                "bedrooms must be between 1 and 20, got {}",
                attributes.bedrooms
            )));
        }
        if !BATHROOM_RANGE.contains(&attributes.bathrooms) {
            return Err(PricingError::InvalidAttributes(format!(
                "bathrooms must be between 1 and 10, got {}",
                attributes.bathrooms
            )));
        }
        Ok(())
    }

    pub fn check(
        &self,
        attributes: &PropertyAttributes,
        point: GeoPoint,
    ) -> Result<(), PricingError> {
        self.check_attributes(attributes)?;
        self.check_point(point)
    }
}

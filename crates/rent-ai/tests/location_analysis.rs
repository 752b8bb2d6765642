//! Ring, sector and premium-zone classification through the public analyzer.

use std::sync::Arc;

use rent_ai::geolocation::{
    ring, CityGeometry, GeoPoint, LocationAnalyzer, Sector, SectorRadiusTable, SANTA_CRUZ_CENTER,
};

fn analyzer() -> LocationAnalyzer {
    LocationAnalyzer::new(Arc::new(
        CityGeometry::santa_cruz().expect("built-in geometry is valid"),
    ))
}

#[test]
fn city_center_is_the_urban_core() {
    let profile = analyzer().analyze(SANTA_CRUZ_CENTER);

    assert_eq!(profile.distance_km, 0.0);
    assert_eq!(profile.ring, 0);
    assert_eq!(profile.ring_label, "Centro");
    assert!(profile.special_zone_name.is_none());
    assert_eq!(profile.zone_code, 0);
    assert_eq!(profile.price_multiplier, 1.0);
}

#[test]
fn ring_boundaries_are_inclusive() {
    let city = CityGeometry::santa_cruz().expect("geometry");
    let first_north = city.radii.radii(Sector::North)[0];

    assert_eq!(first_north, 1.26);
    assert_eq!(ring(1.26, Sector::North, &city.radii), 1);
    assert_eq!(ring(1.27, Sector::North, &city.radii), 2);
    assert_eq!(ring(0.99, Sector::North, &city.radii), 0);
}

#[test]
fn far_points_clamp_to_the_outer_ring() {
    let city = CityGeometry::santa_cruz().expect("geometry");
    for sector in Sector::ALL {
        assert_eq!(ring(50.0, sector, &city.radii), 10, "{sector:?}");
    }

    let profile = analyzer().analyze(GeoPoint::new(-18.24, SANTA_CRUZ_CENTER.lon));
    assert_eq!(profile.sector, Sector::South);
    assert_eq!(profile.ring, 10);
    assert!(profile.distance_km > 45.0);
}

#[test]
fn equipetrol_carries_its_premium() {
    let profile = analyzer().analyze(GeoPoint::new(-17.768, -63.194));

    assert_eq!(profile.special_zone_name.as_deref(), Some("Equipetrol"));
    assert_eq!(profile.zone_code, 101);
    assert_eq!(profile.price_multiplier, 1.5);
    assert!(profile.ring >= 1);
}

#[test]
fn custom_tables_must_grow_outward() {
    let increasing = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
    let mut broken = increasing;
    broken[4] = 3.5;
    broken[5] = 3.5;

    assert!(SectorRadiusTable::new(increasing, increasing, increasing, increasing).is_ok());
    assert!(SectorRadiusTable::new(increasing, broken, increasing, increasing).is_err());
}

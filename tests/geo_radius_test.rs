use bootcamp_service::config::DistanceUnit;
use bootcamp_service::services::geocoder::{
    angular_radius, radius_filter, validate_distance, GeoPoint,
};
use mongodb::bson::Bson;

#[test]
fn radius_query_uses_angular_radius_and_lng_lat_center() {
    // A postal code resolving to (lat 40, lng -75) with a 100 unit distance
    // must produce a containment query centered on [-75, 40] with radius
    // 100/6378 under the kilometer convention.
    let center = GeoPoint {
        latitude: 40.0,
        longitude: -75.0,
    };
    let radius = angular_radius(100.0, DistanceUnit::Kilometers);
    assert_eq!(radius, 100.0 / 6378.0);

    let filter = radius_filter(center, radius);
    let sphere = filter
        .get_document("location")
        .unwrap()
        .get_document("$geoWithin")
        .unwrap()
        .get_array("$centerSphere")
        .unwrap();

    assert_eq!(
        sphere[0],
        Bson::Array(vec![Bson::Double(-75.0), Bson::Double(40.0)])
    );
    assert_eq!(sphere[1], Bson::Double(100.0 / 6378.0));
}

#[test]
fn negative_or_zero_search_distance_is_rejected() {
    assert!(validate_distance(-100.0).is_err());
    assert!(validate_distance(0.0).is_err());
    assert_eq!(validate_distance(100.0).ok(), Some(100.0));
}

#[test]
fn mile_convention_divides_by_mile_earth_radius() {
    assert_eq!(
        angular_radius(100.0, DistanceUnit::Miles),
        100.0 / 3963.0
    );
}

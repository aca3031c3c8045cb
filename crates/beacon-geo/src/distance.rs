//! Great-circle distance math.

use beacon_entity::location::LocationSample;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two `(latitude, longitude)`
/// points in decimal degrees, using the haversine formula.
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Distance in kilometers between two location samples.
pub fn between(a: &LocationSample, b: &LocationSample) -> f64 {
    haversine_km((a.latitude, a.longitude), (b.latitude, b.longitude))
}

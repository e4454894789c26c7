use super::GeoPoint;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two coordinate pairs in degrees,
/// by the haversine formula. Closed-form; non-physical inputs give
/// non-physical output rather than an error.
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    // Rounding can push h a hair past 1.0, which would turn asin into NaN.
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint { latitude, longitude }
    }

    #[test]
    fn identical_points_are_zero_meters_apart() {
        assert_eq!(haversine_m(point(0.0, 0.0), point(0.0, 0.0)), 0.0);
        assert_eq!(haversine_m(point(23.7806, 90.4193), point(23.7806, 90.4193)), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = point(23.7806, 90.4193);
        let b = point(23.8103, 90.4125);
        assert_eq!(haversine_m(a, b), haversine_m(b, a));
    }

    #[test]
    fn one_thousandth_degree_on_the_equator_is_about_111_meters() {
        let d = haversine_m(point(0.0, 0.0), point(0.0, 0.001));
        assert!((d - 111.19).abs() < 0.5, "got {d}");
    }

    #[test]
    fn half_a_thousandth_degree_is_about_55_meters() {
        let d = haversine_m(point(0.0, 0.0), point(0.0, 0.0005));
        assert!((d - 55.6).abs() < 0.5, "got {d}");
    }

    #[test]
    fn antipodal_points_stay_finite() {
        let d = haversine_m(point(90.0, 0.0), point(-90.0, 0.0));
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1.0);
    }
}

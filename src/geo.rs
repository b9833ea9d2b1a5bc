/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Returns the great-circle distance in meters between two coordinates, using the haversine formula.
/// See https://en.wikipedia.org/wiki/Haversine_formula.
pub fn distance_in_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    // Rounding can push `a` just past 1 for nearly antipodal points.
    let a = ((d_lat / 2.0).sin().powi(2) + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2))
        .clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const OFFICE_LAT: f64 = -7.3106665;
    const OFFICE_LON: f64 = 112.7735401;

    #[rstest]
    #[case(OFFICE_LAT, OFFICE_LON)]
    #[case(0.0, 0.0)]
    #[case(90.0, 180.0)]
    #[case(-90.0, -180.0)]
    #[case(51.8615899, 4.3580323)]
    fn distance_to_itself_is_zero(#[case] lat: f64, #[case] lon: f64) {
        assert_eq!(distance_in_meters(lat, lon, lat, lon), 0.0);
    }

    #[rstest]
    #[case(OFFICE_LAT, OFFICE_LON, 51.8615899, 4.3580323)]
    #[case(0.0, 0.0, 0.0, 179.9)]
    #[case(-33.8688, 151.2093, 40.7128, -74.0060)]
    fn distance_is_symmetric(#[case] lat1: f64, #[case] lon1: f64, #[case] lat2: f64, #[case] lon2: f64) {
        let there = distance_in_meters(lat1, lon1, lat2, lon2);
        let back = distance_in_meters(lat2, lon2, lat1, lon1);

        assert!((there - back).abs() < 1e-6, "expected {} to equal {}", there, back);
    }

    #[rstest]
    #[case(0.00135, 150.1)]
    #[case(0.0009, 100.1)]
    #[case(0.009, 1000.8)]
    fn latitude_offset_matches_known_distance(#[case] offset: f64, #[case] expected: f64) {
        let distance = distance_in_meters(OFFICE_LAT, OFFICE_LON, OFFICE_LAT + offset, OFFICE_LON);

        assert!((distance - expected).abs() < 0.5, "expected ~{} meter, got {}", expected, distance);
    }

    #[test]
    fn quarter_meridian_is_a_quarter_of_the_circumference() {
        let distance = distance_in_meters(0.0, 0.0, 90.0, 0.0);
        let expected = EARTH_RADIUS_METERS * std::f64::consts::FRAC_PI_2;

        assert!((distance - expected).abs() < 1e-3);
    }

    #[rstest]
    #[case(0.0, 0.0, 0.0, 180.0)]
    #[case(10.0, 20.0, -10.0, -160.0)]
    #[case(OFFICE_LAT, OFFICE_LON, -OFFICE_LAT, OFFICE_LON - 180.0)]
    #[case(45.0, 0.0, -45.0, 180.0)]
    fn antipodal_distance_is_half_the_circumference(#[case] lat1: f64, #[case] lon1: f64, #[case] lat2: f64, #[case] lon2: f64) {
        let distance = distance_in_meters(lat1, lon1, lat2, lon2);
        let expected = EARTH_RADIUS_METERS * std::f64::consts::PI;

        assert!(!distance.is_nan());
        assert!((distance - expected).abs() < 1.0, "expected ~{} meter, got {}", expected, distance);
    }
}

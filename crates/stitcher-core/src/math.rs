//! Angle and geodetic helpers
//!
//! Angles are radians in our own convention: 0 points east and angles grow
//! counter-clockwise, so PI / 2 is north.

use std::f64::consts::{PI, TAU};

use crate::types::{DMat2, DVec2};

/// WGS-84 semi-major axis in meters
pub const EARTH_MAJOR_AXIS: f64 = 6_378_137.0;

/// WGS-84 first eccentricity squared
pub const EARTH_FIRST_ECCENTRICITY_SQUARED: f64 = 0.006_694_379_990_14;

/// Convert degrees to radians
pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Wrap an angle into `[0, 2PI]`
pub fn normalize_angle(mut radians: f64) -> f64 {
    if !radians.is_finite() {
        return radians;
    }
    while radians < 0.0 {
        radians += TAU;
    }
    while radians > TAU {
        radians -= TAU;
    }
    radians
}

/// Convert a vendor heading (clockwise, 0 = north) into our convention
pub fn convert_rhombus_angle(radians: f64) -> f64 {
    normalize_angle(-radians + 5.0 * PI / 2.0)
}

/// 2x2 counter-clockwise rotation matrix
pub fn rotation(theta: f64) -> DMat2 {
    DMat2::from_angle(theta)
}

/// Convert feet to meters
pub fn feet_to_meters(feet: f64) -> f64 {
    feet / 3.281
}

/// Approximate east/north offset in meters of `pos` from `base`.
///
/// Both positions are `(latitude, longitude)` in degrees. Accurate for the
/// short distances between cameras on one site, not across continents.
pub fn geodetic_to_enu(pos: DVec2, base: DVec2) -> DVec2 {
    let lat = degrees_to_radians(pos.x);
    let lon = degrees_to_radians(pos.y);
    let base_lat = degrees_to_radians(base.x);
    let base_lon = degrees_to_radians(base.y);

    let sin_sq = base_lat.sin().powi(2);
    let denom = 1.0 - EARTH_FIRST_ECCENTRICITY_SQUARED * sin_sq;

    let north = EARTH_MAJOR_AXIS * (1.0 - EARTH_FIRST_ECCENTRICITY_SQUARED) / denom.powf(1.5)
        * (lat - base_lat);
    let east = EARTH_MAJOR_AXIS / denom.sqrt() * base_lat.cos() * (lon - base_lon);

    DVec2::new(east, north)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_degrees_to_radians() {
        assert!((degrees_to_radians(180.0) - PI).abs() < EPS);
        assert!((degrees_to_radians(90.0) - PI / 2.0).abs() < EPS);
    }

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(-PI / 2.0) - 3.0 * PI / 2.0).abs() < EPS);
        assert!((normalize_angle(5.0 * PI) - PI).abs() < EPS);
        assert!((normalize_angle(1.0) - 1.0).abs() < EPS);
        assert_eq!(normalize_angle(TAU), TAU);
        assert!(normalize_angle(f64::NAN).is_nan());
    }

    #[test]
    fn test_convert_rhombus_angle() {
        // North in vendor space is PI / 2 for us
        assert!((convert_rhombus_angle(0.0) - PI / 2.0).abs() < EPS);
        // Vendor east (clockwise quarter turn) is our zero
        let east = convert_rhombus_angle(PI / 2.0);
        assert!(east.abs() < EPS || (east - TAU).abs() < EPS);
        // Vendor west is our PI
        assert!((convert_rhombus_angle(3.0 * PI / 2.0) - PI).abs() < EPS);
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let v = rotation(PI / 2.0) * DVec2::X;
        assert!(v.abs_diff_eq(DVec2::Y, EPS));
    }

    #[test]
    fn test_feet_to_meters() {
        assert!((feet_to_meters(3.281) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_geodetic_to_enu() {
        let base = DVec2::new(37.0, -122.0);
        assert_eq!(geodetic_to_enu(base, base), DVec2::ZERO);

        // One thousandth of a degree north is roughly 111 meters
        let north = geodetic_to_enu(DVec2::new(37.001, -122.0), base);
        assert!(north.x.abs() < EPS);
        assert!((north.y - 111.0).abs() < 1.0);

        // East distances shrink with cos(latitude)
        let east = geodetic_to_enu(DVec2::new(37.0, -121.999), base);
        assert!(east.y.abs() < EPS);
        assert!((east.x - 89.0).abs() < 1.0);
    }
}

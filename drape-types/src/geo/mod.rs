//! Conversion between geographic coordinates (longitude/latitude degrees) and the planar projection
//! (Web Mercator meters) used by the rest of the pipeline.
//!
//! Raw input coordinates carry no reference system, so [`to_planar`] and [`to_geographic`] classify
//! them by range: a pair with both components within `±180` is taken to be geographic, anything else
//! planar. Small planar values (within 180 m of the projection origin) are therefore misread as
//! degrees. This is the documented behavior and is kept as is.

mod datum;
mod projection;
mod web_mercator;

pub use datum::Datum;
pub use projection::Projection;
pub use web_mercator::WebMercator;

use crate::point::{GeoPoint, GeoPoint2d, NewGeoPoint};
use nalgebra::Point2;

/// Largest absolute value a geographic component may have.
pub const GEOGRAPHIC_LIMIT: f64 = 180.0;

/// Returns true if the pair falls into the range treated as geographic degrees.
pub fn is_geographic(x: f64, y: f64) -> bool {
    x.abs() <= GEOGRAPHIC_LIMIT && y.abs() <= GEOGRAPHIC_LIMIT
}

/// Projects a geographic `(lon, lat)` pair to Web Mercator meters rounded to centimeters.
///
/// Pairs outside of the geographic range are returned unchanged. Returns `None` if the pair is
/// within the range but cannot be projected (e.g. latitude beyond a pole).
pub fn to_planar(x: f64, y: f64) -> Option<(f64, f64)> {
    if !is_geographic(x, y) {
        return Some((x, y));
    }

    let projected = WebMercator::default().project(&GeoPoint2d::lonlat(x, y))?;
    Some((round_to(projected.x, 2), round_to(projected.y, 2)))
}

/// Converts a Web Mercator pair back to `(lon, lat)` degrees rounded to 4 decimals.
///
/// Pairs within the geographic range are returned unchanged.
pub fn to_geographic(x: f64, y: f64) -> Option<(f64, f64)> {
    if is_geographic(x, y) {
        return Some((x, y));
    }

    let point = WebMercator::default().unproject(&Point2::new(x, y))?;
    Some((round_to(point.lon(), 4), round_to(point.lat(), 4)))
}

/// Rounds half away from zero to the given number of decimals.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn planar_is_rounded_to_centimeters() {
        let (x, y) = to_planar(-111.02523, 45.63856).expect("in range");
        assert_eq!(round_to(x, 2), x);
        assert_eq!(round_to(y, 2), y);
        assert!(x < -12_000_000.0 && x > -13_000_000.0);
        assert!(y > 5_000_000.0 && y < 6_000_000.0);
    }

    #[test]
    fn planar_input_passes_through() {
        assert_eq!(
            to_planar(-12_359_300.5, 5_722_000.25),
            Some((-12_359_300.5, 5_722_000.25))
        );
        assert_eq!(to_planar(200.0, 10.0), Some((200.0, 10.0)));
    }

    #[test]
    fn geographic_input_passes_through() {
        assert_eq!(to_geographic(10.5, -20.25), Some((10.5, -20.25)));
        assert_eq!(to_geographic(-180.0, 180.0), Some((-180.0, 180.0)));
    }

    #[test]
    fn geographic_is_rounded_to_four_decimals() {
        let (lon, lat) = to_geographic(-12_359_300.0, 5_722_000.0).expect("valid");
        assert_eq!(round_to(lon, 4), lon);
        assert_eq!(round_to(lat, 4), lat);
    }

    #[test]
    fn round_trip_within_tolerance() {
        let samples = [
            (0.0, 0.0),
            (-111.02523, 45.63856),
            (151.2093, -33.8688),
            (-179.5, 84.9),
            (12.4964, 41.9028),
            (0.001, -0.002),
        ];

        for (lon, lat) in samples {
            let (x, y) = to_planar(lon, lat).expect("in range");
            // Values within 180 m of the origin stay on the geographic side of the heuristic.
            if is_geographic(x, y) {
                continue;
            }
            let (back_lon, back_lat) = to_geographic(x, y).expect("valid");
            assert_abs_diff_eq!(back_lon, lon, epsilon = 0.01);
            assert_abs_diff_eq!(back_lat, lat, epsilon = 0.01);
        }
    }

    #[test]
    fn beyond_pole_is_rejected() {
        assert_eq!(to_planar(0.0, 120.0), None);
    }

    #[test]
    fn small_planar_values_are_misread_as_degrees() {
        let (x, _) = to_planar(150.0, 20.0).expect("in range");
        assert!(x > 16_000_000.0);
    }
}

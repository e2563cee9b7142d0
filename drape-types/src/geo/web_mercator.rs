use crate::geo::datum::Datum;
use crate::geo::projection::Projection;
use crate::point::{GeoPoint, GeoPoint2d, NewGeoPoint};
use nalgebra::Point2;

/// Spherical Web Mercator (EPSG:3857) on the semi-major axis of the datum.
#[derive(Debug, Copy, Clone, Default)]
pub struct WebMercator {
    datum: Datum,
}

impl Projection for WebMercator {
    type InPoint = GeoPoint2d;
    type OutPoint = Point2<f64>;

    fn project(&self, input: &GeoPoint2d) -> Option<Point2<f64>> {
        let x = self.datum.semimajor() * input.lon_rad();
        let y = self.datum.semimajor()
            * (std::f64::consts::FRAC_PI_4 + input.lat_rad() / 2.0)
                .tan()
                .ln();

        if x.is_finite() && y.is_finite() {
            Some(Point2::new(x, y))
        } else {
            None
        }
    }

    fn unproject(&self, input: &Point2<f64>) -> Option<GeoPoint2d> {
        let lat = 2.0 * (input.y / self.datum.semimajor()).exp().atan() - std::f64::consts::FRAC_PI_2;
        let lon = input.x / self.datum.semimajor();

        if lat.is_finite() && lon.is_finite() {
            Some(GeoPoint2d::latlon(lat.to_degrees(), lon.to_degrees()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn project_origin() {
        let projection = WebMercator::default();
        let projected = projection
            .project(&GeoPoint2d::latlon(0.0, 0.0))
            .expect("origin projects");
        assert_abs_diff_eq!(projected.x, 0.0);
        assert_abs_diff_eq!(projected.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn project_antimeridian() {
        let projection = WebMercator::default();
        let projected = projection
            .project(&GeoPoint2d::latlon(0.0, 180.0))
            .expect("antimeridian projects");
        assert_abs_diff_eq!(projected.x, 20_037_508.342789244, epsilon = 1e-6);
    }

    #[test]
    fn pole_is_not_projectable() {
        let projection = WebMercator::default();
        assert!(projection.project(&GeoPoint2d::latlon(120.0, 0.0)).is_none());
    }

    #[test]
    fn unproject_inverts_project() {
        let projection = WebMercator::default();
        let point = GeoPoint2d::latlon(45.63856, -111.02523);
        let projected = projection.project(&point).expect("projects");
        let back = projection.unproject(&projected).expect("unprojects");
        assert_abs_diff_eq!(back.lat(), point.lat(), epsilon = 1e-9);
        assert_abs_diff_eq!(back.lon(), point.lon(), epsilon = 1e-9);
    }
}

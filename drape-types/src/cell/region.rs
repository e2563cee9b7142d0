use super::{CellId, MAX_LEVEL};
use nalgebra::Vector3;
use std::f64::consts::{FRAC_PI_2, PI, SQRT_2};

/// Derivative of the minimum cell width metric: cells at level `k` are at least
/// `MIN_WIDTH_DERIV * 2^-k` radians wide.
const MIN_WIDTH_DERIV: f64 = 2.0 * SQRT_2 / 3.0;

/// Slack added to bounds to absorb floating point error.
const BOUND_EPSILON: f64 = 2.0 * f64::EPSILON;

/// Latitude and longitude in radians.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLng {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

impl LatLng {
    /// Creates a location from degrees.
    pub fn from_degrees(lat: f64, lng: f64) -> Self {
        Self {
            lat: lat.to_radians(),
            lng: lng.to_radians(),
        }
    }

    /// Location a direction vector points at.
    pub fn from_point(point: &Vector3<f64>) -> Self {
        Self {
            lat: point.z.atan2((point.x * point.x + point.y * point.y).sqrt()),
            lng: point.y.atan2(point.x),
        }
    }

    /// Unit vector pointing at this location.
    pub fn to_point(&self) -> Vector3<f64> {
        let cos_lat = self.lat.cos();
        Vector3::new(
            cos_lat * self.lng.cos(),
            cos_lat * self.lng.sin(),
            self.lat.sin(),
        )
    }
}

/// Closed latitude/longitude rectangle. Longitudes never wrap: an interval spanning the
/// antimeridian is represented as the full range.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLngRect {
    /// Southern bound.
    pub lat_lo: f64,
    /// Northern bound.
    pub lat_hi: f64,
    /// Western bound.
    pub lng_lo: f64,
    /// Eastern bound.
    pub lng_hi: f64,
}

impl LatLngRect {
    fn from_lat_lng(lat_lng: LatLng) -> Self {
        Self {
            lat_lo: lat_lng.lat,
            lat_hi: lat_lng.lat,
            lng_lo: lat_lng.lng,
            lng_hi: lat_lng.lng,
        }
    }

    fn add(&mut self, lat_lng: LatLng) {
        self.lat_lo = self.lat_lo.min(lat_lng.lat);
        self.lat_hi = self.lat_hi.max(lat_lng.lat);
        self.lng_lo = self.lng_lo.min(lat_lng.lng);
        self.lng_hi = self.lng_hi.max(lat_lng.lng);
    }

    /// Midpoint of both intervals.
    pub fn center(&self) -> LatLng {
        LatLng {
            lat: 0.5 * (self.lat_lo + self.lat_hi),
            lng: 0.5 * (self.lng_lo + self.lng_hi),
        }
    }

    /// Corners, counterclockwise from the south-west one.
    pub fn vertices(&self) -> [LatLng; 4] {
        [
            LatLng {
                lat: self.lat_lo,
                lng: self.lng_lo,
            },
            LatLng {
                lat: self.lat_lo,
                lng: self.lng_hi,
            },
            LatLng {
                lat: self.lat_hi,
                lng: self.lng_hi,
            },
            LatLng {
                lat: self.lat_hi,
                lng: self.lng_lo,
            },
        ]
    }

    /// Smallest cap containing the rectangle, chosen between a cap around the rectangle center
    /// and a cap around the nearer pole.
    pub fn cap_bound(&self) -> Cap {
        let (pole, pole_angle) = if self.lat_hi + self.lat_lo < 0.0 {
            (Vector3::new(0.0, 0.0, -1.0), FRAC_PI_2 + self.lat_hi)
        } else {
            (Vector3::new(0.0, 0.0, 1.0), FRAC_PI_2 - self.lat_lo)
        };
        let pole_cap = Cap::new(pole, pole_angle);

        let lng_span = self.lng_hi - self.lng_lo;
        if (0.0..=PI).contains(&lng_span) {
            let mut mid_cap = Cap::from_point(self.center().to_point());
            for vertex in self.vertices() {
                mid_cap.add_point(&vertex.to_point());
            }
            if mid_cap.height() < pole_cap.height() {
                return mid_cap;
            }
        }

        pole_cap
    }

    fn expand_for_error(&mut self) {
        self.lat_lo = (self.lat_lo - BOUND_EPSILON).max(-FRAC_PI_2);
        self.lat_hi = (self.lat_hi + BOUND_EPSILON).min(FRAC_PI_2);

        if self.lat_lo <= -FRAC_PI_2 || self.lat_hi >= FRAC_PI_2 {
            self.set_full_lng();
        }
    }

    fn set_full_lng(&mut self) {
        self.lng_lo = -PI;
        self.lng_hi = PI;
    }
}

/// Spherical cap: all points within `radius` radians of `center`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Cap {
    center: Vector3<f64>,
    radius: f64,
}

impl Cap {
    /// Cap around `center` (normalized) with a radius clamped to `[0, PI]`.
    pub fn new(center: Vector3<f64>, radius: f64) -> Self {
        Self {
            center: center.normalize(),
            radius: radius.clamp(0.0, PI),
        }
    }

    /// Cap containing a single point.
    pub fn from_point(center: Vector3<f64>) -> Self {
        Self::new(center, 0.0)
    }

    /// Unit vector at the center of the cap.
    pub fn center(&self) -> Vector3<f64> {
        self.center
    }

    /// Angular radius in radians.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Distance from the cap plane to the cap apex along the center axis.
    pub fn height(&self) -> f64 {
        1.0 - self.radius.cos()
    }

    /// Grows the cap so that it contains `point`.
    pub fn add_point(&mut self, point: &Vector3<f64>) {
        let angle = self.center.angle(&point.normalize()) + BOUND_EPSILON;
        if angle > self.radius {
            self.radius = angle.min(PI);
        }
    }

    /// Returns true if the direction is within the cap.
    pub fn contains_point(&self, point: &Vector3<f64>) -> bool {
        self.center.angle(&point.normalize()) <= self.radius
    }

    /// Small set of cells whose union contains the cap.
    ///
    /// Picks the deepest level whose cells are still wider than the cap and returns the cells at
    /// that level sharing the vertex closest to the cap center. Caps too large for any single
    /// level are covered by the six face cells.
    pub fn cell_union_bound(&self) -> Vec<CellId> {
        let level = max_level_for_width(self.radius) - 1;
        if level < 0 {
            return CellId::faces();
        }

        CellId::from_point(&self.center).vertex_neighbors(level as u8)
    }
}

/// Deepest level at which cells are guaranteed to be at least `width` radians wide.
fn max_level_for_width(width: f64) -> i32 {
    if width <= 0.0 {
        return MAX_LEVEL as i32;
    }

    let level = -ilogb(width / MIN_WIDTH_DERIV);
    level.clamp(0, MAX_LEVEL as i32)
}

/// Unbiased binary exponent of a positive finite value.
fn ilogb(value: f64) -> i32 {
    let exponent = ((value.to_bits() >> 52) & 0x7ff) as i32;
    if exponent == 0 {
        value.log2().floor() as i32
    } else {
        exponent - 1023
    }
}

/// Closed chain of points on the sphere connected by great circle arcs.
#[derive(Debug, Clone, PartialEq)]
pub struct SphericalLoop {
    vertices: Vec<Vector3<f64>>,
}

impl SphericalLoop {
    /// Creates a loop from direction vectors. Vectors are normalized; their length is ignored.
    pub fn from_points(points: impl IntoIterator<Item = Vector3<f64>>) -> Self {
        Self {
            vertices: points.into_iter().map(|p| p.normalize()).collect(),
        }
    }

    /// Creates a loop through the given locations.
    pub fn from_lat_lngs(lat_lngs: &[LatLng]) -> Self {
        Self::from_points(lat_lngs.iter().map(LatLng::to_point))
    }

    /// Unit vectors of the loop vertices.
    pub fn vertices(&self) -> &[Vector3<f64>] {
        &self.vertices
    }

    fn edges(&self) -> impl Iterator<Item = (&Vector3<f64>, &Vector3<f64>)> + '_ {
        self.vertices
            .iter()
            .zip(self.vertices.iter().cycle().skip(1))
    }

    /// Latitude/longitude bound of the loop, including the latitude bulge of great circle edges.
    ///
    /// Returns `None` for an empty loop.
    pub fn rect_bound(&self) -> Option<LatLngRect> {
        let first = self.vertices.first()?;
        let mut rect = LatLngRect::from_lat_lng(LatLng::from_point(first));
        let mut wraps = false;

        for (a, b) in self.edges() {
            let a_ll = LatLng::from_point(a);
            let b_ll = LatLng::from_point(b);
            rect.add(b_ll);

            if (a_ll.lng - b_ll.lng).abs() >= PI {
                wraps = true;
            }

            let normal = a.cross(b);
            if normal.norm() < 1e-15 {
                continue;
            }

            // Direction of steepest latitude ascent along the edge's great circle.
            let m = normal.cross(&Vector3::z());
            let m_a = m.dot(a);
            let m_b = m.dot(b);
            if m_a * m_b < 0.0 {
                let max_lat = (normal.x * normal.x + normal.y * normal.y)
                    .sqrt()
                    .atan2(normal.z.abs())
                    .min(FRAC_PI_2);
                if m_a < 0.0 {
                    rect.lat_hi = rect.lat_hi.max(max_lat);
                } else {
                    rect.lat_lo = rect.lat_lo.min(-max_lat);
                }
            }
        }

        if wraps {
            rect.set_full_lng();
            if rect.lat_lo + rect.lat_hi >= 0.0 {
                rect.lat_hi = FRAC_PI_2;
            } else {
                rect.lat_lo = -FRAC_PI_2;
            }
        }

        rect.expand_for_error();
        Some(rect)
    }

    /// Cap containing the rectangle bound of the loop.
    pub fn cap_bound(&self) -> Option<Cap> {
        self.rect_bound().map(|rect| rect.cap_bound())
    }

    /// Cells whose union contains the loop. Empty for an empty loop.
    pub fn cell_union_bound(&self) -> Vec<CellId> {
        self.cap_bound()
            .map(|cap| cap.cell_union_bound())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rectangle(lng_lo: f64, lat_lo: f64, lng_hi: f64, lat_hi: f64) -> SphericalLoop {
        SphericalLoop::from_lat_lngs(&[
            LatLng::from_degrees(lat_hi, lng_hi),
            LatLng::from_degrees(lat_hi, lng_lo),
            LatLng::from_degrees(lat_lo, lng_lo),
            LatLng::from_degrees(lat_lo, lng_hi),
        ])
    }

    #[test]
    fn lat_lng_point_round_trip() {
        let ll = LatLng::from_degrees(45.63856, -111.02523);
        let back = LatLng::from_point(&ll.to_point());
        assert_abs_diff_eq!(back.lat, ll.lat, epsilon = 1e-12);
        assert_abs_diff_eq!(back.lng, ll.lng, epsilon = 1e-12);
    }

    #[test]
    fn rect_bound_includes_edge_bulge() {
        let rect = rectangle(-60.0, 40.0, 60.0, 50.0)
            .rect_bound()
            .expect("not empty");
        assert!(rect.lat_hi > 50f64.to_radians());
        assert_abs_diff_eq!(rect.lat_lo, 40f64.to_radians(), epsilon = 1e-9);
        assert_abs_diff_eq!(rect.lng_lo, (-60f64).to_radians(), epsilon = 1e-9);
    }

    #[test]
    fn cap_bound_contains_loop() {
        let area = rectangle(151.1, -33.95, 151.3, -33.8);
        let cap = area.cap_bound().expect("not empty");
        assert!(cap.radius() > 0.0 && cap.radius() < 0.01);
        for vertex in area.vertices() {
            assert!(cap.contains_point(vertex));
        }
        assert!(cap.contains_point(&cap.center()));
        assert!(!cap.contains_point(&LatLng::from_degrees(-33.0, 151.2).to_point()));
    }

    #[test]
    fn small_cap_gives_deep_cells() {
        let cells = rectangle(-111.03, 45.63, -111.02, 45.64).cell_union_bound();
        assert!(!cells.is_empty() && cells.len() <= 4);
        for cell in &cells {
            assert!(cell.level() > 8);
        }
    }

    #[test]
    fn huge_cap_gives_face_cells() {
        let cap = Cap::new(Vector3::x(), 2.5);
        assert_eq!(cap.cell_union_bound(), CellId::faces());
    }

    #[test]
    fn point_cap_uses_deepest_level() {
        let cap = Cap::from_point(LatLng::from_degrees(10.0, 20.0).to_point());
        let cells = cap.cell_union_bound();
        assert_eq!(cells[0].level(), MAX_LEVEL - 1);
    }

    #[test]
    fn covering_contains_corners_and_center() {
        let cases = [
            (-111.03, 45.63, -111.02, 45.64),
            (151.1, -33.95, 151.3, -33.8),
            (-0.5, 51.3, 0.3, 51.7),
            (10.0, 40.0, 20.0, 48.0),
        ];

        for (lng_lo, lat_lo, lng_hi, lat_hi) in cases {
            let cells = rectangle(lng_lo, lat_lo, lng_hi, lat_hi).cell_union_bound();
            let samples = [
                LatLng::from_degrees(lat_hi, lng_hi),
                LatLng::from_degrees(lat_lo, lng_lo),
                LatLng::from_degrees(lat_hi, lng_lo),
                LatLng::from_degrees(lat_lo, lng_hi),
                LatLng::from_degrees((lat_lo + lat_hi) / 2.0, (lng_lo + lng_hi) / 2.0),
            ];

            for sample in samples {
                let leaf = CellId::from_lat_lng(&sample);
                assert!(
                    cells.iter().any(|cell| cell.contains(&leaf)),
                    "{sample:?} not covered by {cells:?}"
                );
            }
        }
    }

    #[test]
    fn ilogb_matches_exponent() {
        assert_eq!(ilogb(1.0), 0);
        assert_eq!(ilogb(0.75), -1);
        assert_eq!(ilogb(8.5), 3);
        assert_eq!(ilogb(1e-3), -10);
    }
}

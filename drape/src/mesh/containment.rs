use geo::{Coord, Intersects, MultiPolygon};

/// Point-in-polygon test honoring holes.
pub trait Containment: Send + Sync {
    /// Returns true if `point` belongs to `area`.
    fn contains(&self, area: &MultiPolygon<f64>, point: [f64; 2]) -> bool;
}

/// Treats polygons as closed regions: points on any boundary, hole boundaries included, are
/// inside, points strictly within a hole are outside.
#[derive(Debug, Copy, Clone, Default)]
pub struct ClosedRegion;

impl Containment for ClosedRegion {
    fn contains(&self, area: &MultiPolygon<f64>, point: [f64; 2]) -> bool {
        let coord = Coord {
            x: point[0],
            y: point[1],
        };
        area.0.iter().any(|polygon| polygon.intersects(&coord))
    }
}

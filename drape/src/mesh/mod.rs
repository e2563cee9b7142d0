//! Drape meshes for polygons without explicit elevation.
//!
//! A polygon is sampled into a point cloud, every sample gets a ground elevation, and the cloud is
//! triangulated. For multipolygons, samples and triangles falling into holes are removed. The
//! three collaborators are traits so that alternative samplers, triangulators or containment rules
//! can be plugged in.

mod containment;
mod sampler;
mod triangulate;

pub use containment::{ClosedRegion, Containment};
pub use sampler::{GridSampler, PolygonSampler};
pub use triangulate::{Delaunay, Triangulator};

use crate::elevation::ElevationSource;
use crate::error::DrapeError;
use drape_types::geo::{to_geographic, to_planar};
use drape_types::Mesh;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use std::sync::Arc;

/// How the point cloud is treated before and after triangulation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MeshKind {
    /// Whole cloud is triangulated.
    Polygon,
    /// Samples and triangles inside holes are removed.
    MultiPolygon,
}

/// Returns true if any ring starts with a coordinate carrying a non-zero elevation.
///
/// Only the first vertex of each ring is inspected.
pub fn has_explicit_elevation<'a>(rings: impl IntoIterator<Item = &'a Vec<Vec<f64>>>) -> bool {
    rings
        .into_iter()
        .filter_map(|ring| ring.first())
        .any(|coordinate| coordinate.get(2).is_some_and(|z| *z != 0.0))
}

/// Builds drape meshes.
#[derive(Clone)]
pub struct MeshBuilder {
    sampler: Arc<dyn PolygonSampler>,
    triangulator: Arc<dyn Triangulator>,
    containment: Arc<dyn Containment>,
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new(Arc::new(GridSampler::default()))
    }
}

impl MeshBuilder {
    /// Builder with the given sampler, Delaunay triangulation and closed region containment.
    pub fn new(sampler: Arc<dyn PolygonSampler>) -> Self {
        Self {
            sampler,
            triangulator: Arc::new(Delaunay),
            containment: Arc::new(ClosedRegion),
        }
    }

    /// Replaces the triangulation.
    pub fn with_triangulator(mut self, triangulator: Arc<dyn Triangulator>) -> Self {
        self.triangulator = triangulator;
        self
    }

    /// Replaces the containment rule used by the multipolygon filters.
    pub fn with_containment(mut self, containment: Arc<dyn Containment>) -> Self {
        self.containment = containment;
        self
    }

    /// Builds the mesh for polygons given as raw `polygon -> ring -> coordinate` arrays.
    ///
    /// Coordinates may be geographic or planar; the mesh vertices are planar with the ground
    /// elevation as `z`.
    pub fn build(
        &self,
        polygons: &[Vec<Vec<Vec<f64>>>],
        kind: MeshKind,
        elevation: &dyn ElevationSource,
    ) -> Result<Mesh, DrapeError> {
        let area = geographic_area(polygons)?;
        let samples = self.sampler.sample(&area)?;

        let mut cloud: Vec<[f64; 3]> = Vec::with_capacity(samples.len());
        let mut missing = 0;
        for [lon, lat] in samples {
            if kind == MeshKind::MultiPolygon && !self.containment.contains(&area, [lon, lat]) {
                continue;
            }

            match elevation.lookup(lon, lat) {
                Ok(z) => cloud.push([lon, lat, z]),
                Err(err) => {
                    missing += 1;
                    log::debug!("Mesh sample dropped: {err}");
                }
            }
        }

        if missing > 0 {
            log::debug!("{missing} mesh samples without elevation were dropped");
        }
        if cloud.is_empty() {
            return Err(DrapeError::PolygonSampling(
                "no sample inside the polygon has an elevation".into(),
            ));
        }

        let points: Vec<[f64; 2]> = cloud.iter().map(|&[x, y, _]| [x, y]).collect();
        let indices = self.triangulator.triangulate(&points)?;
        let mut mesh = Mesh::new(cloud, indices)?;

        if kind == MeshKind::MultiPolygon {
            mesh.indices = self.remove_hole_triangles(&area, &mesh);
            if mesh.is_empty() {
                return Err(DrapeError::Triangulation(
                    "every triangle falls outside of the polygon".into(),
                ));
            }
        }

        for vertex in &mut mesh.vertices {
            let [lon, lat, z] = *vertex;
            let (x, y) = to_planar(lon, lat).ok_or_else(|| {
                DrapeError::Triangulation(format!("({lon}, {lat}) cannot be projected"))
            })?;
            *vertex = [x, y, z];
        }

        Ok(mesh)
    }

    /// Keeps triangles of a geographic mesh whose centroid is inside the area.
    fn remove_hole_triangles(&self, area: &MultiPolygon<f64>, mesh: &Mesh) -> Vec<usize> {
        let total = mesh.triangle_count();
        let kept: Vec<usize> = mesh
            .indices
            .chunks_exact(3)
            .zip(mesh.triangles())
            .filter(|(_, [a, b, c])| {
                let centroid = [(a[0] + b[0] + c[0]) / 3.0, (a[1] + b[1] + c[1]) / 3.0];
                self.containment.contains(area, centroid)
            })
            .flat_map(|(triangle, _)| triangle.iter().copied())
            .collect();

        log::debug!(
            "{} of {total} triangles removed by the hole filter",
            total - kept.len() / 3
        );
        kept
    }
}

/// Converts raw rings into a geographic multipolygon.
fn geographic_area(polygons: &[Vec<Vec<Vec<f64>>>]) -> Result<MultiPolygon<f64>, DrapeError> {
    let mut result = Vec::with_capacity(polygons.len());
    for polygon in polygons {
        let Some((exterior, interiors)) = polygon.split_first() else {
            continue;
        };
        if exterior.is_empty() {
            log::debug!("Polygon without exterior vertices skipped");
            continue;
        }

        let interiors = interiors
            .iter()
            .filter(|ring| !ring.is_empty())
            .map(|ring| geographic_ring(ring))
            .collect::<Result<Vec<_>, _>>()?;
        result.push(Polygon::new(geographic_ring(exterior)?, interiors));
    }

    if result.is_empty() {
        return Err(DrapeError::PolygonSampling("polygon has no rings".into()));
    }

    Ok(MultiPolygon::new(result))
}

fn geographic_ring(ring: &[Vec<f64>]) -> Result<LineString<f64>, DrapeError> {
    ring.iter()
        .map(|coordinate| match coordinate[..] {
            [x, y, ..] => to_geographic(x, y)
                .filter(|(lon, lat)| lon.is_finite() && lat.is_finite())
                .map(|(x, y)| Coord { x, y })
                .ok_or_else(|| {
                    DrapeError::PolygonSampling(format!("({x}, {y}) is not a valid vertex"))
                }),
            _ => Err(DrapeError::PolygonSampling(format!(
                "vertex with {} components",
                coordinate.len()
            ))),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevation::ConstantElevation;
    use crate::error::ElevationError;
    use assert_matches::assert_matches;

    fn ring(points: &[(f64, f64)]) -> Vec<Vec<f64>> {
        points.iter().map(|&(x, y)| vec![x, y]).collect()
    }

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Vec<f64>> {
        ring(&[
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
            (x0, y0),
        ])
    }

    fn builder(spacing: f64) -> MeshBuilder {
        MeshBuilder::new(Arc::new(GridSampler::new(spacing, 10_000)))
    }

    #[test]
    fn explicit_elevation_check() {
        let flat = vec![square(0.0, 0.0, 1.0)];
        assert!(!has_explicit_elevation(&flat));

        let zero = vec![vec![vec![1.0, 2.0, 0.0], vec![2.0, 2.0, 15.0]]];
        assert!(!has_explicit_elevation(&zero));

        let raised = vec![square(0.0, 0.0, 1.0), vec![vec![1.0, 2.0, 8.0]]];
        assert!(has_explicit_elevation(&raised));
    }

    #[test]
    fn polygon_mesh() {
        let polygons = vec![vec![square(10.0, 10.0, 0.1)]];
        let mesh = builder(0.02)
            .build(&polygons, MeshKind::Polygon, &ConstantElevation(250.0))
            .expect("mesh");

        assert!(mesh.triangle_count() > 0);
        assert!(mesh.indices.iter().all(|&i| i < mesh.vertices.len()));
        let (x, y) = to_planar(10.05, 10.05).expect("in range");
        for [vx, vy, vz] in &mesh.vertices {
            assert_eq!(*vz, 250.0);
            assert!((vx - x).abs() < 10_000.0 && (vy - y).abs() < 10_000.0);
        }
    }

    #[test]
    fn planar_rings_are_accepted() {
        let (x0, y0) = to_planar(10.0, 10.0).expect("in range");
        let (x1, y1) = to_planar(10.1, 10.1).expect("in range");
        let polygons = vec![vec![ring(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)])]];
        let mesh = builder(0.02)
            .build(&polygons, MeshKind::Polygon, &ConstantElevation(1.0))
            .expect("mesh");
        assert!(mesh.triangle_count() > 0);
    }

    #[test]
    fn hole_exclusion() {
        let outer = square(10.0, 10.0, 1.0);
        let hole = square(10.4, 10.4, 0.2);
        let polygons = vec![vec![outer, hole]];
        let mesh = builder(0.05)
            .build(&polygons, MeshKind::MultiPolygon, &ConstantElevation(5.0))
            .expect("mesh");
        assert!(mesh.triangle_count() > 0);

        // The hole in planar coordinates, shrunk to stay clear of projection distortion.
        let (hx0, hy0) = to_planar(10.41, 10.41).expect("in range");
        let (hx1, hy1) = to_planar(10.59, 10.59).expect("in range");
        for [a, b, c] in mesh.triangles() {
            let cx = (a[0] + b[0] + c[0]) / 3.0;
            let cy = (a[1] + b[1] + c[1]) / 3.0;
            let in_hole = cx > hx0 && cx < hx1 && cy > hy0 && cy < hy1;
            assert!(!in_hole, "triangle centroid ({cx}, {cy}) is inside the hole");
        }

        // Without the filter the hole would be covered.
        let unfiltered = builder(0.05)
            .build(&polygons, MeshKind::Polygon, &ConstantElevation(5.0))
            .expect("mesh");
        assert!(unfiltered.triangle_count() > mesh.triangle_count());
    }

    #[test]
    fn samples_without_elevation_are_dropped() {
        let polygons = vec![vec![square(10.0, 10.0, 0.1)]];
        let half = |lon: f64, lat: f64| -> Result<f64, ElevationError> {
            if lon < 10.05 {
                Ok(100.0)
            } else {
                Err(ElevationError::ZNotFound { lon, lat })
            }
        };
        let mesh = builder(0.02)
            .build(&polygons, MeshKind::Polygon, &half)
            .expect("mesh");
        let (x_limit, _) = to_planar(10.05, 10.0).expect("in range");
        assert!(mesh.vertices.iter().all(|v| v[0] < x_limit));
    }

    #[test]
    fn no_elevation_at_all() {
        let polygons = vec![vec![square(10.0, 10.0, 0.1)]];
        let none = |lon: f64, lat: f64| -> Result<f64, ElevationError> {
            Err(ElevationError::ZNotFound { lon, lat })
        };
        assert_matches!(
            builder(0.02).build(&polygons, MeshKind::Polygon, &none),
            Err(DrapeError::PolygonSampling(_))
        );
    }

    #[test]
    fn degenerate_polygon() {
        let polygons = vec![vec![ring(&[(10.0, 10.0), (10.5, 10.5), (11.0, 11.0), (10.0, 10.0)])]];
        assert_matches!(
            builder(0.1).build(&polygons, MeshKind::Polygon, &ConstantElevation(0.0)),
            Err(DrapeError::Triangulation(_))
        );
    }

    struct Fan;

    impl Triangulator for Fan {
        fn triangulate(&self, points: &[[f64; 2]]) -> Result<Vec<usize>, DrapeError> {
            Ok((1..points.len() - 1).flat_map(|i| [0, i, i + 1]).collect())
        }
    }

    struct Dangling;

    impl Triangulator for Dangling {
        fn triangulate(&self, points: &[[f64; 2]]) -> Result<Vec<usize>, DrapeError> {
            Ok(vec![0, 1, points.len() + 5])
        }
    }

    struct Everywhere;

    impl Containment for Everywhere {
        fn contains(&self, _area: &MultiPolygon<f64>, _point: [f64; 2]) -> bool {
            true
        }
    }

    #[test]
    fn custom_triangulator() {
        let polygons = vec![vec![square(10.0, 10.0, 0.1)]];
        let mesh = builder(0.05)
            .with_triangulator(Arc::new(Fan))
            .build(&polygons, MeshKind::Polygon, &ConstantElevation(1.0))
            .expect("mesh");
        assert_eq!(mesh.triangle_count(), mesh.vertices.len() - 2);
        assert!(mesh.indices.chunks_exact(3).all(|t| t[0] == 0));
    }

    #[test]
    fn dangling_triangle_index_is_an_error() {
        let polygons = vec![vec![square(10.0, 10.0, 1.0), square(10.4, 10.4, 0.2)]];
        for kind in [MeshKind::Polygon, MeshKind::MultiPolygon] {
            assert_matches!(
                builder(0.1)
                    .with_triangulator(Arc::new(Dangling))
                    .build(&polygons, kind, &ConstantElevation(1.0)),
                Err(DrapeError::Triangulation(_))
            );
        }
    }

    #[test]
    fn custom_containment_keeps_the_hole() {
        let polygons = vec![vec![square(10.0, 10.0, 1.0), square(10.4, 10.4, 0.2)]];
        let plain = builder(0.05)
            .build(&polygons, MeshKind::Polygon, &ConstantElevation(5.0))
            .expect("mesh");
        let everywhere = builder(0.05)
            .with_containment(Arc::new(Everywhere))
            .build(&polygons, MeshKind::MultiPolygon, &ConstantElevation(5.0))
            .expect("mesh");
        assert_eq!(everywhere, plain);
    }

    #[test]
    fn polygon_without_exterior_is_skipped() {
        let polygons = vec![vec![vec![]], vec![square(10.0, 10.0, 0.1)]];
        let mesh = builder(0.05)
            .build(&polygons, MeshKind::MultiPolygon, &ConstantElevation(1.0))
            .expect("mesh");
        assert!(mesh.triangle_count() > 0);
    }

    #[test]
    fn malformed_vertex() {
        let polygons = vec![vec![vec![vec![1.0]]]];
        assert_matches!(
            builder(0.1).build(&polygons, MeshKind::Polygon, &ConstantElevation(0.0)),
            Err(DrapeError::PolygonSampling(_))
        );
    }
}

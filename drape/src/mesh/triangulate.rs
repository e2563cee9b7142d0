use crate::error::DrapeError;
use spade::{DelaunayTriangulation, Triangulation as _};

/// Triangulates a 2D point set.
pub trait Triangulator: Send + Sync {
    /// Returns a flat list of triangle indices (three per triangle) into `points`.
    ///
    /// Duplicate points are referenced through their first occurrence.
    fn triangulate(&self, points: &[[f64; 2]]) -> Result<Vec<usize>, DrapeError>;
}

/// Delaunay triangulation of the convex hull of the points.
#[derive(Debug, Copy, Clone, Default)]
pub struct Delaunay;

impl Triangulator for Delaunay {
    fn triangulate(&self, points: &[[f64; 2]]) -> Result<Vec<usize>, DrapeError> {
        let mut triangulation: DelaunayTriangulation<spade::Point2<f64>> =
            DelaunayTriangulation::new();
        // Triangulation vertex index -> index of the point that created it.
        let mut sources = Vec::with_capacity(points.len());

        for (index, &[x, y]) in points.iter().enumerate() {
            let before = triangulation.num_vertices();
            triangulation
                .insert(spade::Point2::new(x, y))
                .map_err(|e| DrapeError::Triangulation(format!("point {index}: {e:?}")))?;
            if triangulation.num_vertices() > before {
                sources.push(index);
            }
        }

        let mut indices = Vec::with_capacity(triangulation.num_inner_faces() * 3);
        for face in triangulation.inner_faces() {
            for vertex in face.vertices() {
                indices.push(sources[vertex.fix().index()]);
            }
        }

        if indices.is_empty() {
            return Err(DrapeError::Triangulation(format!(
                "{} points do not form a triangle",
                points.len()
            )));
        }

        Ok(indices)
    }
}

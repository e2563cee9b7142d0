use crate::error::DrapeTypesError;
use serde::{Deserialize, Serialize};

/// Triangulated surface: a vertex array and a flat list of triangle indices (three per triangle).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Vertex positions.
    pub vertices: Vec<[f64; 3]>,
    /// Vertex indices, three per triangle.
    pub indices: Vec<usize>,
}

impl Mesh {
    /// Creates a mesh, checking that every index points at an existing vertex.
    pub fn new(vertices: Vec<[f64; 3]>, indices: Vec<usize>) -> Result<Self, DrapeTypesError> {
        if indices.len() % 3 != 0 {
            return Err(DrapeTypesError::IncompleteTriangle(indices.len()));
        }

        if let Some(&index) = indices.iter().find(|&&i| i >= vertices.len()) {
            return Err(DrapeTypesError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }

        Ok(Self { vertices, indices })
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns true if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterates over triangles as triples of vertex references.
    pub fn triangles(&self) -> impl Iterator<Item = [&[f64; 3]; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [&self.vertices[t[0]], &self.vertices[t[1]], &self.vertices[t[2]]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_dangling_index() {
        let result = Mesh::new(vec![[0.0; 3], [1.0; 3], [2.0; 3]], vec![0, 1, 3]);
        assert!(matches!(
            result,
            Err(DrapeTypesError::IndexOutOfRange {
                index: 3,
                vertex_count: 3
            })
        ));
    }

    #[test]
    fn rejects_partial_triangle() {
        let result = Mesh::new(vec![[0.0; 3], [1.0; 3]], vec![0, 1]);
        assert!(matches!(result, Err(DrapeTypesError::IncompleteTriangle(2))));
    }

    #[test]
    fn iterates_triangles() {
        let mesh = Mesh::new(
            vec![[0.0, 0.0, 1.0], [1.0, 0.0, 2.0], [0.0, 1.0, 3.0], [1.0, 1.0, 4.0]],
            vec![0, 1, 2, 1, 3, 2],
        )
        .expect("valid mesh");

        assert_eq!(mesh.triangle_count(), 2);
        let second = mesh.triangles().nth(1).expect("two triangles");
        assert_eq!(second[1], &[1.0, 1.0, 4.0]);
    }
}

//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error)]
pub enum DrapeTypesError {
    /// Geometry conversion error.
    #[error("invalid input geometry: {0}")]
    Conversion(String),
    /// Mesh references a vertex that does not exist.
    #[error("triangle index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
    /// Triangle index list length is not a multiple of three.
    #[error("triangle index list has {0} entries, expected a multiple of 3")]
    IncompleteTriangle(usize),
}

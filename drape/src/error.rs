//! Error types used by the crate.

use thiserror::Error;

/// Error returned by an [`ElevationSource`](crate::elevation::ElevationSource).
#[derive(Debug, Error)]
pub enum ElevationError {
    /// The source has no elevation for the location.
    #[error("no elevation found at ({lon}, {lat})")]
    ZNotFound {
        /// Longitude of the failed lookup.
        lon: f64,
        /// Latitude of the failed lookup.
        lat: f64,
    },
    /// Source specific failure.
    #[error("elevation source error: {0}")]
    Source(String),
    /// Failed to read the elevation data.
    #[error("failed to read elevation data")]
    Io(#[from] std::io::Error),
    /// Elevation data is not in a supported format.
    #[error("failed to parse elevation data: {0}")]
    Parse(String),
}

/// Drape error type.
#[derive(Debug, Error)]
pub enum DrapeError {
    /// Coordinate has the wrong number of components or non-finite values.
    #[error("malformed coordinate: {0}")]
    MalformedCoordinate(String),
    /// Elevation could not be derived for a 2D coordinate.
    #[error("elevation unavailable")]
    ElevationUnavailable(#[source] ElevationError),
    /// Geometry type is not one of Point, LineString, Polygon or MultiPolygon.
    #[error("unsupported geometry type: {0}")]
    UnsupportedGeometry(String),
    /// No row or feature survived the conversion.
    #[error("dataset has no valid features")]
    EmptyDataset,
    /// Input contains no features at all.
    #[error("input contains no features")]
    NoFeatures,
    /// Extent was never populated, so the dataset has no center.
    #[error("dataset extent is empty")]
    InvalidDataset,
    /// Geometry does not have enough valid vertices.
    #[error("conversion error: {0}")]
    Conversion(String),
    /// Surface mesh could not be triangulated.
    #[error("triangulation failed: {0}")]
    Triangulation(String),
    /// Polygon interior could not be sampled.
    #[error("polygon sampling failed: {0}")]
    PolygonSampling(String),
    /// CSV header lacks a required coordinate column.
    #[error("column `{0}` not found in CSV header")]
    MissingColumn(String),
    /// Deadline elapsed.
    #[error("timed out after {0} ms")]
    Timeout(u64),
    /// Error reading CSV input.
    #[error("failed to read CSV")]
    Csv(#[from] csv::Error),
    /// Error parsing GeoJSON input.
    #[error("failed to parse GeoJSON")]
    GeoJson(#[from] geojson::Error),
    /// Error reading/writing data to the FS.
    #[error("failed to read file")]
    Io(#[from] std::io::Error),
    /// A worker task panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for DrapeError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Task(value.to_string())
    }
}

impl From<drape_types::error::DrapeTypesError> for DrapeError {
    fn from(value: drape_types::error::DrapeTypesError) -> Self {
        Self::Triangulation(value.to_string())
    }
}

impl DrapeError {
    /// Returns true for errors produced by the surface mesh builder.
    pub fn is_mesh_failure(&self) -> bool {
        matches!(self, Self::Triangulation(_) | Self::PolygonSampling(_))
    }
}

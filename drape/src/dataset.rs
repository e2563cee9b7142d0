//! Output model of a conversion.
//!
//! The JSON layout is consumed by an existing renderer, so field names follow it rather than Rust
//! conventions (`type`, `dataurl`, `lastUpdated`, `s2`).

use chrono::{DateTime, SecondsFormat, Utc};
use drape_types::Mesh;
use serde::{Deserialize, Serialize};

/// Planar coordinate with elevation, serialized as `{x, y, z}`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Planar X in meters.
    pub x: f64,
    /// Planar Y in meters.
    pub y: f64,
    /// Elevation in meters.
    pub z: f64,
}

impl From<Coordinate> for [f64; 3] {
    fn from(value: Coordinate) -> Self {
        [value.x, value.y, value.z]
    }
}

/// Key/value pair attached to a feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Property name.
    pub key: String,
    /// Property value rendered as text.
    pub value: String,
}

impl Attribute {
    /// Creates an attribute.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Single location feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointFeature {
    /// Identifier taken from a reserved id property.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Renderer style, from the `styletype` property.
    #[serde(rename = "type")]
    pub style_type: String,
    /// Remaining properties in key order.
    pub attributes: Vec<Attribute>,
    /// Planar position with elevation.
    pub point: [f64; 3],
}

/// Polyline feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineFeature {
    /// Identifier taken from a reserved id property.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Renderer style, from the `styletype` property.
    #[serde(rename = "type")]
    pub style_type: String,
    /// Remaining properties in key order.
    pub attributes: Vec<Attribute>,
    /// Vertices in input order.
    pub points: Vec<[f64; 3]>,
}

/// Geometry of a shape: either its rings as given, or a surface mesh draped over the terrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShapeGeometry {
    /// Rings with explicit elevation. For multipolygons, the rings of every polygon in order.
    Rings {
        /// Ring coordinates.
        points: Vec<Vec<[f64; 3]>>,
    },
    /// Triangulated surface.
    Mesh(Mesh),
}

impl Default for ShapeGeometry {
    fn default() -> Self {
        Self::Rings { points: vec![] }
    }
}

/// Polygon or multipolygon feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeFeature {
    /// Identifier taken from a reserved id property.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Renderer style, from the `styletype` property.
    #[serde(rename = "type")]
    pub style_type: String,
    /// Remaining properties in key order.
    pub attributes: Vec<Attribute>,
    /// Rings or mesh.
    #[serde(flatten)]
    pub geometry: ShapeGeometry,
}

impl ShapeFeature {
    /// Mesh of a draped shape.
    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.geometry {
            ShapeGeometry::Mesh(mesh) => Some(mesh),
            ShapeGeometry::Rings { .. } => None,
        }
    }

    /// Rings of a shape with explicit elevation.
    pub fn rings(&self) -> Option<&[Vec<[f64; 3]>]> {
        match &self.geometry {
            ShapeGeometry::Rings { points } => Some(points),
            ShapeGeometry::Mesh(_) => None,
        }
    }
}

/// Any converted feature.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    /// Point.
    Point(PointFeature),
    /// Line string.
    Line(LineFeature),
    /// Polygon or multipolygon.
    Shape(ShapeFeature),
}

/// Result of a conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Dataset id.
    pub id: String,
    /// Dataset name.
    pub name: String,
    /// Where the input was downloaded from.
    #[serde(rename = "dataurl")]
    pub url: String,
    /// RFC 3339 timestamp.
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
    /// Always exactly one coordinate for a converted dataset.
    pub center: Vec<Coordinate>,
    /// Cell tokens covering the extent.
    pub s2: Vec<String>,
    /// Point features in input order.
    pub points: Vec<PointFeature>,
    /// Line features in input order.
    pub lines: Vec<LineFeature>,
    /// Shape features in input order.
    pub shapes: Vec<ShapeFeature>,
}

impl Dataset {
    pub(crate) fn new(info: &DatasetInfo) -> Self {
        Self {
            id: info.id.clone(),
            name: info.name.clone(),
            url: info.url.clone(),
            last_updated: info
                .last_updated
                .unwrap_or_else(Utc::now)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            ..Default::default()
        }
    }

    pub(crate) fn push(&mut self, feature: Feature) {
        match feature {
            Feature::Point(point) => self.points.push(point),
            Feature::Line(line) => self.lines.push(line),
            Feature::Shape(shape) => self.shapes.push(shape),
        }
    }

    /// Number of features of every kind.
    pub fn feature_count(&self) -> usize {
        self.points.len() + self.lines.len() + self.shapes.len()
    }

    /// Returns true if the dataset has no features.
    pub fn is_empty(&self) -> bool {
        self.feature_count() == 0
    }
}

/// Caller supplied description of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    /// Dataset id.
    pub id: String,
    /// Dataset name.
    pub name: String,
    /// Where the input was downloaded from.
    pub url: String,
    /// Defaults to the conversion time.
    pub last_updated: Option<DateTime<Utc>>,
}

impl DatasetInfo {
    /// Description stamped with the conversion time.
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            last_updated: None,
        }
    }

    /// Uses a fixed timestamp instead of the conversion time.
    pub fn with_last_updated(mut self, last_updated: DateTime<Utc>) -> Self {
        self.last_updated = Some(last_updated);
        self
    }
}

/// Names of the coordinate columns of a CSV file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvFields {
    /// Longitude or planar X column.
    pub x: String,
    /// Latitude or planar Y column.
    pub y: String,
    /// Elevation column, if the file has one.
    pub z: Option<String>,
}

impl CsvFields {
    /// Fields without an elevation column.
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            z: None,
        }
    }

    /// Adds an elevation column.
    pub fn with_z(mut self, z: impl Into<String>) -> Self {
        self.z = Some(z.into());
        self
    }
}

impl Default for CsvFields {
    fn default() -> Self {
        Self::new("x", "y")
    }
}

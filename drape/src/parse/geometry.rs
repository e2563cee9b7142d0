use crate::error::DrapeError;
use crate::extent::PendingExtent;
use crate::normalize::Normalizer;

/// Nested coordinate array that can be normalized level by level.
///
/// `DEPTH` is the number of array levels above the raw coordinate: 0 for a position, 1 for a line,
/// 2 for a polygon, 3 for a multipolygon. Each level peels one array and delegates to the level
/// below, so the same traversal serves every geometry type.
pub trait Peel {
    /// Normalized counterpart of the array.
    type Normalized;

    /// Nesting depth of the array.
    const DEPTH: usize;

    /// Normalizes every coordinate. Below the top level, elements that fail are dropped.
    fn peel(
        &self,
        normalizer: &Normalizer,
        extent: Option<&mut PendingExtent>,
    ) -> Result<Self::Normalized, DrapeError>;

    /// Number of coordinates in a normalized array.
    fn point_count(normalized: &Self::Normalized) -> usize;
}

impl Peel for Vec<f64> {
    type Normalized = [f64; 3];
    const DEPTH: usize = 0;

    fn peel(
        &self,
        normalizer: &Normalizer,
        extent: Option<&mut PendingExtent>,
    ) -> Result<[f64; 3], DrapeError> {
        normalizer.normalize(self, extent)
    }

    fn point_count(_normalized: &[f64; 3]) -> usize {
        1
    }
}

impl<T: Peel> Peel for Vec<T> {
    type Normalized = Vec<T::Normalized>;
    const DEPTH: usize = T::DEPTH + 1;

    fn peel(
        &self,
        normalizer: &Normalizer,
        mut extent: Option<&mut PendingExtent>,
    ) -> Result<Self::Normalized, DrapeError> {
        let mut normalized = Vec::with_capacity(self.len());
        for element in self {
            match element.peel(normalizer, extent.as_deref_mut()) {
                Ok(value) => normalized.push(value),
                Err(err) => log::debug!("Dropped element at depth {}: {err}", T::DEPTH),
            }
        }

        Ok(normalized)
    }

    fn point_count(normalized: &Self::Normalized) -> usize {
        normalized.iter().map(T::point_count).sum()
    }
}

/// Normalized geometry of a feature.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedGeometry {
    /// Single position.
    Point([f64; 3]),
    /// Line with at least 2 points.
    Line(Vec<[f64; 3]>),
    /// Rings of a polygon, together with the raw rings for meshing. Raw vertices that cannot be
    /// normalized are left out of `raw` as well.
    Polygon {
        rings: Vec<Vec<[f64; 3]>>,
        raw: Vec<Vec<Vec<f64>>>,
    },
    /// Polygons of a multipolygon, together with the raw polygons for meshing. Invalid raw
    /// vertices are left out as for polygons.
    MultiPolygon {
        polygons: Vec<Vec<Vec<[f64; 3]>>>,
        raw: Vec<Vec<Vec<Vec<f64>>>>,
    },
}

/// Normalizes a GeoJSON geometry.
///
/// Lines need at least 2 valid coordinates and polygons at least 3, otherwise the geometry fails
/// with [`DrapeError::Conversion`]. Types other than Point, LineString, Polygon and MultiPolygon
/// are [`DrapeError::UnsupportedGeometry`].
pub fn parse_geometry(
    geometry: &geojson::Value,
    normalizer: &Normalizer,
    extent: Option<&mut PendingExtent>,
) -> Result<ParsedGeometry, DrapeError> {
    use geojson::Value;

    match geometry {
        Value::Point(position) => Ok(ParsedGeometry::Point(position.peel(normalizer, extent)?)),
        Value::LineString(line) => {
            let points = peel_at_least(line, 2, "line", normalizer, extent)?;
            Ok(ParsedGeometry::Line(points))
        }
        Value::Polygon(rings) => {
            let normalized = peel_at_least(rings, 3, "polygon", normalizer, extent)?;
            Ok(ParsedGeometry::Polygon {
                rings: normalized,
                raw: valid_rings(rings),
            })
        }
        Value::MultiPolygon(polygons) => {
            let normalized = peel_at_least(polygons, 3, "multipolygon", normalizer, extent)?;
            Ok(ParsedGeometry::MultiPolygon {
                polygons: normalized,
                raw: polygons.iter().map(|rings| valid_rings(rings)).collect(),
            })
        }
        other => Err(DrapeError::UnsupportedGeometry(
            geometry_type_name(other).to_string(),
        )),
    }
}

fn peel_at_least<T: Peel>(
    value: &T,
    min_points: usize,
    kind: &str,
    normalizer: &Normalizer,
    extent: Option<&mut PendingExtent>,
) -> Result<T::Normalized, DrapeError> {
    let normalized = value.peel(normalizer, extent)?;
    let count = T::point_count(&normalized);
    if count < min_points {
        return Err(DrapeError::Conversion(format!(
            "{kind} has {count} valid points, at least {min_points} required"
        )));
    }

    Ok(normalized)
}

fn valid_rings(rings: &[Vec<Vec<f64>>]) -> Vec<Vec<Vec<f64>>> {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .filter(|coordinate| Normalizer::is_valid(coordinate))
                .cloned()
                .collect()
        })
        .collect()
}

pub(crate) fn geometry_type_name(value: &geojson::Value) -> &'static str {
    use geojson::Value;

    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

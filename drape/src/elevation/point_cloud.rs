use super::ElevationSource;
use crate::error::ElevationError;
use drape_types::geo::to_geographic;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::Deserialize;
use std::path::Path;

/// Terrain samples `[lon, lat, z]` in geographic degrees and meters.
///
/// Two file formats are understood:
/// * JSON `{"points": [{"x": .., "y": .., "z": ..}, ..]}`;
/// * plain text with one `x y z` triple per line (whitespace or comma separated), as written by
///   GDAL's XYZ driver.
///
/// Samples with `z == 0` are nodata and skipped. Planar samples are converted to degrees.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    samples: Vec<[f64; 3]>,
}

#[derive(Deserialize)]
struct JsonCloud {
    points: Vec<JsonSample>,
}

#[derive(Deserialize)]
struct JsonSample {
    x: f64,
    y: f64,
    z: f64,
}

impl PointCloud {
    /// Creates a cloud from raw samples, dropping nodata samples.
    pub fn from_samples(samples: impl IntoIterator<Item = [f64; 3]>) -> Self {
        let mut skipped = 0;
        let samples = samples
            .into_iter()
            .filter_map(|[x, y, z]| {
                if z == 0.0 || !z.is_finite() {
                    skipped += 1;
                    return None;
                }

                let Some((lon, lat)) = to_geographic(x, y) else {
                    skipped += 1;
                    return None;
                };

                Some([lon, lat, z])
            })
            .collect();

        if skipped > 0 {
            log::debug!("Skipped {skipped} nodata elevation samples");
        }

        Self { samples }
    }

    /// Reads a cloud from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ElevationError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parses a cloud, detecting the format from the first non-blank character.
    pub fn parse(contents: &str) -> Result<Self, ElevationError> {
        if contents.trim_start().starts_with('{') {
            let cloud: JsonCloud =
                serde_json::from_str(contents).map_err(|e| ElevationError::Parse(e.to_string()))?;
            return Ok(Self::from_samples(
                cloud.points.into_iter().map(|p| [p.x, p.y, p.z]),
            ));
        }

        let mut samples = vec![];
        for (line_number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let values: Vec<f64> = line
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|part| !part.is_empty())
                .map(str::parse)
                .collect::<Result<_, _>>()
                .map_err(|e| ElevationError::Parse(format!("line {}: {e}", line_number + 1)))?;

            match values[..] {
                [x, y, z] => samples.push([x, y, z]),
                _ => {
                    return Err(ElevationError::Parse(format!(
                        "line {}: expected 3 values, found {}",
                        line_number + 1,
                        values.len()
                    )))
                }
            }
        }

        Ok(Self::from_samples(samples))
    }

    /// Samples as `[lon, lat, z]`.
    pub fn samples(&self) -> &[[f64; 3]] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct IndexedSample {
    lon: f64,
    lat: f64,
    z: f64,
}

impl RTreeObject for IndexedSample {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lon, self.lat])
    }
}

impl PointDistance for IndexedSample {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.lon - point[0];
        let dy = self.lat - point[1];
        dx * dx + dy * dy
    }
}

/// Elevation of the nearest DEM sample, if it lies within the search radius.
pub struct PointCloudElevation {
    tree: RTree<IndexedSample>,
    search_radius: f64,
}

impl PointCloudElevation {
    /// Indexes the cloud. `search_radius` is in degrees.
    pub fn new(cloud: PointCloud, search_radius: f64) -> Self {
        let samples = cloud
            .samples
            .into_iter()
            .map(|[lon, lat, z]| IndexedSample { lon, lat, z })
            .collect();

        Self {
            tree: RTree::bulk_load(samples),
            search_radius,
        }
    }

    /// Number of indexed samples.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns true if the index holds no samples.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl ElevationSource for PointCloudElevation {
    fn elevation(&self, lon: f64, lat: f64) -> Result<f64, ElevationError> {
        let point = [lon, lat];
        match self.tree.nearest_neighbor(&point) {
            Some(sample) if sample.distance_2(&point) <= self.search_radius * self.search_radius => {
                Ok(sample.z)
            }
            _ => Err(ElevationError::ZNotFound { lon, lat }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const JSON_CLOUD: &str = r#"{"points": [
        {"x": -111.0, "y": 45.0, "z": 1500.0},
        {"x": -111.01, "y": 45.0, "z": 1510.0},
        {"x": -111.0, "y": 45.01, "z": 0.0},
        {"x": -111.01, "y": 45.01, "z": 1520.0}
    ]}"#;

    #[test]
    fn parses_json_and_skips_nodata() {
        let cloud = PointCloud::parse(JSON_CLOUD).expect("valid");
        assert_eq!(cloud.len(), 3);
        assert_eq!(cloud.samples()[1], [-111.01, 45.0, 1510.0]);
    }

    #[test]
    fn parses_xyz_lines() {
        let cloud = PointCloud::parse("# lon lat z\n10 20 5\n\n10.5,20.5,6\n11 21 0\n").expect("valid");
        assert_eq!(cloud.samples(), &[[10.0, 20.0, 5.0], [10.5, 20.5, 6.0]]);
    }

    #[test]
    fn planar_samples_become_geographic() {
        let cloud = PointCloud::parse("-12358000 5621000 1400").expect("valid");
        let [lon, lat, z] = cloud.samples()[0];
        assert!(lon > -112.0 && lon < -110.0);
        assert!(lat > 44.0 && lat < 46.0);
        assert_eq!(z, 1400.0);
    }

    #[test]
    fn rejects_short_line() {
        assert_matches!(PointCloud::parse("1 2\n"), Err(ElevationError::Parse(_)));
        assert_matches!(PointCloud::parse("1 two 3\n"), Err(ElevationError::Parse(_)));
        assert_matches!(PointCloud::parse("{\"points\": 5}"), Err(ElevationError::Parse(_)));
    }

    #[test]
    fn nearest_within_radius() {
        let source = PointCloudElevation::new(PointCloud::parse(JSON_CLOUD).expect("valid"), 0.005);
        assert_eq!(source.len(), 3);
        assert_eq!(source.lookup(-111.001, 45.001).expect("near"), 1500.0);
        assert_eq!(source.lookup(-111.009, 45.009).expect("near"), 1520.0);
        assert_matches!(
            source.lookup(-110.0, 45.0),
            Err(ElevationError::ZNotFound { .. })
        );
    }

    #[test]
    fn empty_cloud_finds_nothing() {
        let source = PointCloudElevation::new(PointCloud::default(), 1.0);
        assert!(source.is_empty());
        assert_matches!(source.lookup(0.0, 0.0), Err(ElevationError::ZNotFound { .. }));
    }
}

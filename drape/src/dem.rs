//! Terrain point clouds as datasets.
//!
//! Every DEM sample becomes a point, and the whole cloud is triangulated into one surface. The
//! cloud doubles as the elevation source for the center and the covering.

use crate::convert::assemble_dataset;
use crate::dataset::{Dataset, DatasetInfo, Feature, PointFeature, ShapeFeature, ShapeGeometry};
use crate::elevation::{PointCloud, PointCloudElevation};
use crate::error::DrapeError;
use crate::extent::DatasetExtent;
use crate::mesh::{Delaunay, Triangulator};
use drape_types::geo::to_planar;
use drape_types::{Extent, Mesh};

/// Converts a DEM point cloud into a dataset.
///
/// `search_radius` (degrees) bounds the nearest-sample lookup used for the center elevation.
/// Fails with [`DrapeError::EmptyDataset`] if the cloud has no samples and with
/// [`DrapeError::Triangulation`] if they do not span a surface.
pub fn convert_dem(
    cloud: PointCloud,
    info: &DatasetInfo,
    search_radius: f64,
) -> Result<Dataset, DrapeError> {
    if cloud.is_empty() {
        return Err(DrapeError::EmptyDataset);
    }

    let mut vertices = Vec::with_capacity(cloud.len());
    let mut extent: Option<Extent> = None;
    for &[lon, lat, z] in cloud.samples() {
        let (x, y) = to_planar(lon, lat)
            .ok_or_else(|| DrapeError::MalformedCoordinate(format!("({lon}, {lat})")))?;
        match &mut extent {
            Some(extent) => extent.grow(x, y),
            None => extent = Some(Extent::from_xy(x, y)),
        }
        vertices.push([x, y, z]);
    }

    let planar: Vec<[f64; 2]> = cloud.samples().iter().map(|&[lon, lat, _]| [lon, lat]).collect();
    let indices = Delaunay.triangulate(&planar)?;
    let mesh = Mesh::new(vertices.clone(), indices)?;
    log::debug!(
        "DEM {}: {} samples, {} triangles",
        info.id,
        vertices.len(),
        mesh.triangle_count()
    );

    let mut features: Vec<Feature> = vertices
        .into_iter()
        .enumerate()
        .map(|(index, point)| {
            Feature::Point(PointFeature {
                id: index.to_string(),
                point,
                ..Default::default()
            })
        })
        .collect();
    features.push(Feature::Shape(ShapeFeature {
        id: info.id.clone(),
        name: info.name.clone(),
        geometry: ShapeGeometry::Mesh(mesh),
        ..Default::default()
    }));

    let elevation = PointCloudElevation::new(cloud, search_radius);
    assemble_dataset(info, features, &DatasetExtent(extent), &elevation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn grid() -> PointCloud {
        let mut text = String::from("# lon lat z\n");
        for row in 0..5 {
            for column in 0..5 {
                let z = if row == 2 && column == 3 {
                    0.0
                } else {
                    1000.0 + (row * 5 + column) as f64
                };
                text.push_str(&format!(
                    "{} {} {z}\n",
                    -111.0 + column as f64 * 0.001,
                    45.0 + row as f64 * 0.001
                ));
            }
        }

        PointCloud::parse(&text).expect("valid cloud")
    }

    #[test]
    fn one_point_per_sample() {
        let info = DatasetInfo::new("dem", "Terrain", "");
        let dataset = convert_dem(grid(), &info, 0.01).expect("converted");

        assert_eq!(dataset.points.len(), 24);
        assert_eq!(dataset.shapes.len(), 1);
        let mesh = dataset.shapes[0].mesh().expect("mesh");
        assert_eq!(mesh.vertices.len(), 24);
        assert!(mesh.triangle_count() > 0);
        assert!(mesh.indices.iter().all(|&i| i < mesh.vertices.len()));

        assert_eq!(dataset.center.len(), 1);
        assert!(dataset.center[0].z >= 1000.0);
        assert!(!dataset.s2.is_empty());
    }

    #[test]
    fn empty_cloud() {
        let cloud = PointCloud::from_samples([[1.0, 2.0, 0.0]]);
        assert_matches!(
            convert_dem(cloud, &DatasetInfo::default(), 0.01),
            Err(DrapeError::EmptyDataset)
        );
    }

    #[test]
    fn collinear_cloud() {
        let cloud = PointCloud::from_samples([[1.0, 1.0, 5.0], [2.0, 2.0, 5.0], [3.0, 3.0, 5.0]]);
        assert_matches!(
            convert_dem(cloud, &DatasetInfo::default(), 0.01),
            Err(DrapeError::Triangulation(_))
        );
    }
}

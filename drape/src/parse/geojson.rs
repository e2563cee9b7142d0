//! GeoJSON input: points, lines, polygons and multipolygons.

use super::{collect_features, run_blocking, ParseContext, ParseOutcome, TaskResult, WorkerPool};
use super::{parse_geometry, ParsedGeometry};
use crate::attributes::FeatureProperties;
use crate::dataset::{Feature, LineFeature, PointFeature, ShapeFeature, ShapeGeometry};
use crate::error::DrapeError;
use crate::extent::{ExtentSender, PendingExtent};
use crate::mesh::{has_explicit_elevation, MeshKind};
use ::geojson::feature::Id;
use ::geojson::GeoJson;

/// Reads the features of a GeoJSON document.
///
/// A feature collection gives its features, a single feature gives itself and a bare geometry is
/// wrapped into a feature without properties.
pub fn read_features(input: &str) -> Result<Vec<::geojson::Feature>, DrapeError> {
    Ok(match input.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![::geojson::Feature::from(geometry)],
    })
}

/// Converts a GeoJSON document into features.
///
/// Features are converted concurrently. Features that fail are dropped, except for mesh failures
/// when `abort_on_mesh_failure` is set, which fail the whole parse.
pub(crate) async fn parse_geojson(
    input: &str,
    context: &ParseContext,
    extent: ExtentSender,
) -> Result<ParseOutcome, DrapeError> {
    let features = read_features(input)?;
    if features.is_empty() {
        return Err(DrapeError::NoFeatures);
    }

    let mut pool = WorkerPool::new(context.max_workers);
    for (index, feature) in features.into_iter().enumerate() {
        pool.spawn(index, convert_feature(feature, context.clone(), extent.clone()))
            .await?;
    }
    drop(extent);

    let abort = context.abort_on_mesh_failure;
    let outcome = collect_features(pool.join().await?, "feature", |err| {
        abort && err.is_mesh_failure()
    })?;
    if outcome.features.is_empty() {
        return Err(DrapeError::EmptyDataset);
    }

    Ok(outcome)
}

enum Built {
    Point([f64; 3]),
    Line(Vec<[f64; 3]>),
    Shape(ShapeGeometry),
}

/// Properties and geometry are handled by two blocking sub-tasks. Only the geometry is bounded
/// by the feature timeout. The feature's coordinates reach the extent only if it is kept.
async fn convert_feature(
    feature: ::geojson::Feature,
    context: ParseContext,
    extent: ExtentSender,
) -> TaskResult {
    let fallback_id = feature.id.map(|id| match id {
        Id::String(id) => id,
        Id::Number(id) => id.to_string(),
    });
    let Some(geometry) = feature.geometry else {
        log::warn!("Feature {fallback_id:?} has no geometry, skipped");
        return Ok(None);
    };
    let properties = feature.properties.unwrap_or_default();

    let deadline = context.feature_timeout;
    let (properties, built) = tokio::join!(
        run_blocking(None, move || Ok(FeatureProperties::extract(&properties))),
        run_blocking(deadline, move || build_geometry(geometry.value, &context)),
    );

    let (built, pending) = built?;
    let mut properties = properties?;
    if properties.id.is_empty() {
        if let Some(id) = fallback_id {
            properties.id = id;
        }
    }

    let FeatureProperties {
        id,
        name,
        style_type,
        attributes,
    } = properties;
    pending.commit(&extent).await;

    Ok(Some(match built {
        Built::Point(point) => Feature::Point(PointFeature {
            id,
            name,
            style_type,
            attributes,
            point,
        }),
        Built::Line(points) => Feature::Line(LineFeature {
            id,
            name,
            style_type,
            attributes,
            points,
        }),
        Built::Shape(geometry) => Feature::Shape(ShapeFeature {
            id,
            name,
            style_type,
            attributes,
            geometry,
        }),
    }))
}

fn build_geometry(
    value: ::geojson::Value,
    context: &ParseContext,
) -> Result<(Built, PendingExtent), DrapeError> {
    let elevation = context.normalizer.elevation();
    let mut pending = PendingExtent::default();

    let built = match parse_geometry(&value, &context.normalizer, Some(&mut pending))? {
        ParsedGeometry::Point(point) => Built::Point(point),
        ParsedGeometry::Line(points) => Built::Line(points),
        ParsedGeometry::Polygon { rings, raw } => {
            if has_explicit_elevation(&raw) {
                Built::Shape(ShapeGeometry::Rings { points: rings })
            } else {
                let mesh = context.mesher.build(&[raw], MeshKind::Polygon, elevation)?;
                Built::Shape(ShapeGeometry::Mesh(mesh))
            }
        }
        ParsedGeometry::MultiPolygon { polygons, raw } => {
            if has_explicit_elevation(raw.iter().flatten()) {
                let points = polygons.into_iter().flatten().collect();
                Built::Shape(ShapeGeometry::Rings { points })
            } else {
                let mesh = context
                    .mesher
                    .build(&raw, MeshKind::MultiPolygon, elevation)?;
                Built::Shape(ShapeGeometry::Mesh(mesh))
            }
        }
    };

    Ok((built, pending))
}

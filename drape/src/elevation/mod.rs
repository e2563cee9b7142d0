//! Terrain elevation lookup.
//!
//! The conversion pipeline only ever asks one question of the terrain: "how high is the ground at
//! this longitude/latitude?". [`ElevationSource`] is that question as a trait. A source is built
//! once, before the conversion starts, and shared between worker tasks.

mod point_cloud;

pub use crate::error::ElevationError;
pub use point_cloud::{PointCloud, PointCloudElevation};

use crate::config::ElevationConfig;
use std::sync::Arc;

/// Provides ground elevation in meters for geographic coordinates (degrees).
pub trait ElevationSource: Send + Sync {
    /// Returns the elevation at `(lon, lat)`.
    fn elevation(&self, lon: f64, lat: f64) -> Result<f64, ElevationError>;

    /// Same as [`ElevationSource::elevation`], but a `NaN` result is reported as
    /// [`ElevationError::ZNotFound`].
    fn lookup(&self, lon: f64, lat: f64) -> Result<f64, ElevationError> {
        let z = self.elevation(lon, lat)?;
        if z.is_nan() {
            return Err(ElevationError::ZNotFound { lon, lat });
        }

        Ok(z)
    }
}

impl<F> ElevationSource for F
where
    F: Fn(f64, f64) -> Result<f64, ElevationError> + Send + Sync,
{
    fn elevation(&self, lon: f64, lat: f64) -> Result<f64, ElevationError> {
        self(lon, lat)
    }
}

/// Flat terrain.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ConstantElevation(pub f64);

impl ElevationSource for ConstantElevation {
    fn elevation(&self, _lon: f64, _lat: f64) -> Result<f64, ElevationError> {
        Ok(self.0)
    }
}

/// Builds the elevation source described by the configuration.
///
/// A constant height takes precedence; otherwise the DEM point cloud at
/// [`ElevationConfig::resolve_dem_path`] is loaded.
pub fn from_config(config: &ElevationConfig) -> Result<Arc<dyn ElevationSource>, ElevationError> {
    if let Some(z) = config.constant {
        log::info!("Using flat terrain at {z} m");
        return Ok(Arc::new(ConstantElevation(z)));
    }

    let path = config.resolve_dem_path();
    let cloud = PointCloud::load(&path)?;
    log::info!(
        "Loaded {} elevation samples from {}",
        cloud.len(),
        path.display()
    );

    Ok(Arc::new(PointCloudElevation::new(
        cloud,
        config.search_radius_degrees,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    // `assert_matches!` formats the whole `Result` on failure.
    impl std::fmt::Debug for dyn ElevationSource {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("dyn ElevationSource")
        }
    }

    #[test]
    fn nan_is_not_found() {
        let source = |_lon: f64, _lat: f64| -> Result<f64, ElevationError> { Ok(f64::NAN) };
        assert_matches!(
            source.lookup(1.0, 2.0),
            Err(ElevationError::ZNotFound { lon, lat }) if lon == 1.0 && lat == 2.0
        );
    }

    #[test]
    fn closure_source() {
        let source = |lon: f64, lat: f64| -> Result<f64, ElevationError> { Ok(lon + lat) };
        assert_eq!(source.lookup(1.5, 2.0).expect("found"), 3.5);
    }

    #[test]
    fn constant_source() {
        assert_eq!(ConstantElevation(1450.0).lookup(-111.0, 45.0).expect("found"), 1450.0);
    }

    #[test]
    fn config_constant_wins_over_dem() {
        let config = ElevationConfig {
            constant: Some(3.0),
            dem_path: Some("does/not/exist.json".into()),
            ..Default::default()
        };
        let source = from_config(&config).expect("constant source");
        assert_eq!(source.lookup(0.0, 0.0).expect("found"), 3.0);
    }

    #[test]
    fn missing_dem_file() {
        let config = ElevationConfig {
            dem_path: Some("does/not/exist.json".into()),
            ..Default::default()
        };
        assert_matches!(from_config(&config), Err(ElevationError::Io(_)));
    }

    #[test]
    fn dem_file_source() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "-111.0 45.0 1500\n-111.001 45.0 1510").expect("written");

        let config = ElevationConfig {
            dem_path: Some(file.path().to_path_buf()),
            search_radius_degrees: 0.0005,
            ..Default::default()
        };
        let source = from_config(&config).expect("dem source");
        assert_eq!(source.lookup(-111.0001, 45.0).expect("found"), 1500.0);
        assert_matches!(
            source.lookup(-112.0, 45.0),
            Err(ElevationError::ZNotFound { .. })
        );
    }
}

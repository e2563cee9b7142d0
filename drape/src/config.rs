//! Conversion settings, loadable from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a usable configuration:
//!
//! ```toml
//! max_workers = 50
//! feature_timeout_ms = 2000
//!
//! [sampling]
//! spacing_degrees = 0.0005
//!
//! [elevation]
//! dem_path = "terrain/earthdem.json"
//! search_radius_degrees = 0.01
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable consulted for the DEM path when the configuration does not set one.
pub const DEM_PATH_ENV: &str = "DRAPE_DEM";

/// DEM file used when neither the configuration nor the environment name one.
pub const DEFAULT_DEM_PATH: &str = "earthdem.json";

/// Error loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config file {path}")]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// File is not valid TOML or has fields of the wrong type.
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Settings of a single conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Maximum number of row/feature tasks in flight.
    pub max_workers: usize,
    /// Capacity of the queue feeding the extent aggregator.
    pub channel_capacity: usize,
    /// Deadline for the blocking work of one row or feature.
    pub feature_timeout_ms: Option<u64>,
    /// Deadline for the whole conversion.
    pub conversion_timeout_ms: Option<u64>,
    /// Treat unparsable CSV numbers as zero instead of dropping the row.
    pub lenient_numbers: bool,
    /// Fail the whole conversion when a surface mesh cannot be built.
    pub abort_on_mesh_failure: bool,
    /// Polygon interior sampling.
    pub sampling: SamplingConfig,
    /// Terrain source.
    pub elevation: ElevationConfig,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            max_workers: 50,
            channel_capacity: 1024,
            feature_timeout_ms: None,
            conversion_timeout_ms: None,
            lenient_numbers: false,
            abort_on_mesh_failure: true,
            sampling: SamplingConfig::default(),
            elevation: ElevationConfig::default(),
        }
    }
}

impl ConvertConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&contents)?;
        log::debug!("Loaded configuration from {}", path.display());

        Ok(config)
    }

    pub(crate) fn feature_timeout(&self) -> Option<Duration> {
        self.feature_timeout_ms.map(Duration::from_millis)
    }

    pub(crate) fn conversion_timeout(&self) -> Option<Duration> {
        self.conversion_timeout_ms.map(Duration::from_millis)
    }

    pub(crate) fn worker_permits(&self) -> usize {
        self.max_workers.max(1)
    }
}

/// Settings of the grid sampler used for draped polygons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Distance between grid rows and columns, in degrees.
    pub spacing_degrees: f64,
    /// Upper bound on the number of grid samples per feature. The spacing is widened to stay
    /// under it.
    pub max_samples: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            spacing_degrees: 0.001,
            max_samples: 10_000,
        }
    }
}

/// Where elevations come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationConfig {
    /// DEM point cloud file.
    pub dem_path: Option<PathBuf>,
    /// Maximum distance, in degrees, between a lookup and the nearest DEM sample.
    pub search_radius_degrees: f64,
    /// Use a flat terrain at this height instead of a DEM.
    pub constant: Option<f64>,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            dem_path: None,
            search_radius_degrees: 0.01,
            constant: None,
        }
    }
}

impl ElevationConfig {
    /// DEM path from the configuration, then from the `DRAPE_DEM` environment variable, then
    /// `earthdem.json` in the working directory.
    pub fn resolve_dem_path(&self) -> PathBuf {
        if let Some(path) = &self.dem_path {
            return path.clone();
        }

        match std::env::var_os(DEM_PATH_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_DEM_PATH),
        }
    }
}

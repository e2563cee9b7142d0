//! Drape converts CSV and GeoJSON datasets into 3D feature collections ready for a terrain
//! renderer.
//!
//! Every coordinate is projected to Web Mercator meters and, when the input does not carry a
//! height, given the ground elevation at that location. Polygons without explicit elevation are
//! turned into surface meshes draped over the terrain. The resulting [`Dataset`] also carries the
//! center of the data and a list of spherical cell tokens covering its extent.
//!
//! ```no_run
//! use drape::{ConvertConfig, Converter, CsvFields, DatasetInfo};
//!
//! # async fn run() -> Result<(), drape::DrapeError> {
//! let converter = Converter::from_config(ConvertConfig::default())?;
//! let info = DatasetInfo::new("trees", "Trees", "https://example.org/trees.csv");
//! let dataset = converter
//!     .convert_csv(b"x,y,kind\n-111.0,45.0,oak\n", &CsvFields::default(), &info)
//!     .await?;
//! println!("{}", serde_json::to_string(&dataset).unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! The main parts are:
//! * [`Converter`], which runs a conversion and owns the [`ElevationSource`];
//! * the [`parse`] module with one concurrent task per CSV row or GeoJSON feature;
//! * the [`extent`] aggregator that folds every coordinate into the dataset extent;
//! * the [`mesh`] module building drape meshes for polygons.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod attributes;
pub mod config;
mod convert;
pub mod covering;
pub mod dataset;
mod dem;
pub mod elevation;
pub mod error;
pub mod extent;
pub mod mesh;
mod normalize;
pub mod parse;

pub use config::ConvertConfig;
pub use convert::{Converter, InputFormat};
pub use dataset::{CsvFields, Dataset, DatasetInfo};
pub use dem::convert_dem;
pub use drape_types;
pub use elevation::ElevationSource;
pub use error::{DrapeError, ElevationError};
pub use normalize::Normalizer;

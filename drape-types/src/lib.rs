//! Geometry primitives shared by the `drape` conversion pipeline.
//!
//! * [`geo`] converts between geographic (degrees) and planar (Web Mercator meters) coordinates,
//!   including the range heuristic used to decide which one a raw coordinate is in.
//! * [`Extent`] is the axis-aligned rectangle grown by every observed coordinate.
//! * [`cell`] derives spherical cell ids and tokens covering a region.
//! * [`Mesh`] is the vertex + triangle index container produced for draped polygons.

pub mod cell;
pub mod error;
mod extent;
pub mod geo;
mod mesh;
mod point;

pub use extent::Extent;
pub use mesh::Mesh;
pub use point::{CartesianPoint2d, GeoPoint, GeoPoint2d, NewGeoPoint};

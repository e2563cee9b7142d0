use crate::elevation::ElevationSource;
use crate::error::DrapeError;
use crate::extent::PendingExtent;
use drape_types::geo::{to_geographic, to_planar};
use std::sync::Arc;

/// Turns raw input coordinates into planar `[x, y, z]` triples.
///
/// * 2 components: `x, y` are projected and `z` is taken from the elevation source.
/// * 3 components: `x, y` are projected and `z` is kept as given.
/// * anything else is [`DrapeError::MalformedCoordinate`].
///
/// Successfully normalized coordinates are recorded in the pending extent, if one is given.
#[derive(Clone)]
pub struct Normalizer {
    elevation: Arc<dyn ElevationSource>,
}

impl Normalizer {
    /// Normalizer backfilling missing elevations from `elevation`.
    pub fn new(elevation: Arc<dyn ElevationSource>) -> Self {
        Self { elevation }
    }

    /// Elevation source used for backfilling.
    pub fn elevation(&self) -> &dyn ElevationSource {
        &*self.elevation
    }

    pub(crate) fn elevation_source(&self) -> Arc<dyn ElevationSource> {
        self.elevation.clone()
    }

    /// Returns true if `raw` has 2 or 3 finite components that can be projected. Elevation is
    /// not looked up.
    pub fn is_valid(raw: &[f64]) -> bool {
        project(raw).is_ok()
    }

    /// Normalizes one coordinate.
    pub fn normalize(
        &self,
        raw: &[f64],
        extent: Option<&mut PendingExtent>,
    ) -> Result<[f64; 3], DrapeError> {
        let Projected {
            planar: (px, py),
            geographic: (lon, lat),
            explicit_z,
        } = project(raw)?;

        let z = match explicit_z {
            Some(z) => z,
            None => self
                .elevation
                .lookup(lon, lat)
                .map_err(DrapeError::ElevationUnavailable)?,
        };

        if let Some(extent) = extent {
            extent.push(px, py);
        }

        Ok([px, py, z])
    }
}

struct Projected {
    planar: (f64, f64),
    geographic: (f64, f64),
    explicit_z: Option<f64>,
}

fn project(raw: &[f64]) -> Result<Projected, DrapeError> {
    let (x, y, explicit_z) = match *raw {
        [x, y] => (x, y, None),
        [x, y, z] => (x, y, Some(z)),
        _ => {
            return Err(DrapeError::MalformedCoordinate(format!(
                "expected 2 or 3 components, found {}",
                raw.len()
            )))
        }
    };

    if !x.is_finite() || !y.is_finite() {
        return Err(malformed(x, y));
    }

    let finite = |(a, b): &(f64, f64)| a.is_finite() && b.is_finite();
    let planar = to_planar(x, y)
        .filter(finite)
        .ok_or_else(|| malformed(x, y))?;
    let geographic = to_geographic(x, y)
        .filter(finite)
        .ok_or_else(|| malformed(x, y))?;

    Ok(Projected {
        planar,
        geographic,
        explicit_z,
    })
}

fn malformed(x: f64, y: f64) -> DrapeError {
    DrapeError::MalformedCoordinate(format!("({x}, {y}) cannot be projected"))
}

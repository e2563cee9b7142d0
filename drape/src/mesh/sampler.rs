use crate::config::SamplingConfig;
use crate::error::DrapeError;
use geo::{BoundingRect, Coord, Intersects, MultiPolygon, Polygon};

/// Produces a 2D point cloud covering the interior of polygons.
pub trait PolygonSampler: Send + Sync {
    /// Returns sample locations in the same units as the polygon coordinates.
    fn sample(&self, area: &MultiPolygon<f64>) -> Result<Vec<[f64; 2]>, DrapeError>;
}

/// Regular grid over the exterior rings plus every ring vertex.
///
/// Grid points are kept if they lie inside (or on) an exterior ring; holes are not consulted, so
/// filtering them out is up to the caller. Ring vertices, hole vertices included, are always part
/// of the sample so the mesh follows the outline.
#[derive(Debug, Clone)]
pub struct GridSampler {
    spacing: f64,
    max_samples: usize,
}

impl GridSampler {
    /// Creates a sampler with the given spacing in degrees and sample cap.
    pub fn new(spacing: f64, max_samples: usize) -> Self {
        Self {
            spacing,
            max_samples: max_samples.max(1),
        }
    }

    /// Grid spacing to use for a `width` x `height` box so that the grid stays under the sample
    /// cap.
    fn effective_spacing(&self, width: f64, height: f64) -> f64 {
        let columns = (width / self.spacing).floor() + 1.0;
        let rows = (height / self.spacing).floor() + 1.0;
        let count = columns * rows;
        if count <= self.max_samples as f64 {
            return self.spacing;
        }

        let widened = self.spacing * (count / self.max_samples as f64).sqrt();
        log::debug!(
            "Grid of {count} samples exceeds the cap of {}, spacing widened from {} to {widened}",
            self.max_samples,
            self.spacing
        );
        widened
    }
}

impl From<&SamplingConfig> for GridSampler {
    fn from(config: &SamplingConfig) -> Self {
        Self::new(config.spacing_degrees, config.max_samples)
    }
}

impl Default for GridSampler {
    fn default() -> Self {
        Self::from(&SamplingConfig::default())
    }
}

impl PolygonSampler for GridSampler {
    fn sample(&self, area: &MultiPolygon<f64>) -> Result<Vec<[f64; 2]>, DrapeError> {
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(DrapeError::PolygonSampling(format!(
                "invalid grid spacing {}",
                self.spacing
            )));
        }

        let bounds = area
            .bounding_rect()
            .ok_or_else(|| DrapeError::PolygonSampling("polygon has no vertices".into()))?;
        if !(bounds.width().is_finite() && bounds.height().is_finite()) {
            return Err(DrapeError::PolygonSampling(
                "polygon has non-finite coordinates".into(),
            ));
        }

        let exteriors: Vec<Polygon<f64>> = area
            .0
            .iter()
            .map(|polygon| Polygon::new(polygon.exterior().clone(), vec![]))
            .collect();

        let spacing = self.effective_spacing(bounds.width(), bounds.height());
        let columns = (bounds.width() / spacing).floor() as usize + 1;
        let rows = (bounds.height() / spacing).floor() as usize + 1;

        let mut samples = vec![];
        for row in 0..rows {
            let y = bounds.min().y + row as f64 * spacing;
            for column in 0..columns {
                let coord = Coord {
                    x: bounds.min().x + column as f64 * spacing,
                    y,
                };
                if exteriors.iter().any(|polygon| polygon.intersects(&coord)) {
                    samples.push([coord.x, coord.y]);
                }
            }
        }

        for polygon in &area.0 {
            for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                // Closing vertex repeats the first one.
                let open = ring.0.len().saturating_sub(usize::from(ring.is_closed()));
                samples.extend(ring.0[..open].iter().map(|c| [c.x, c.y]));
            }
        }

        if samples.is_empty() {
            return Err(DrapeError::PolygonSampling("no samples produced".into()));
        }

        Ok(samples)
    }
}

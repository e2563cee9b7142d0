//! Spherical cell tokens covering a dataset extent.

use crate::elevation::ElevationSource;
use drape_types::cell::{LatLng, SphericalLoop};
use drape_types::geo::{to_geographic, Datum};
use drape_types::Extent;

/// Longest token kept in a covering. Longer tokens are cut, which coarsens the cell.
pub const MAX_TOKEN_LEN: usize = 8;

/// Derives the cell tokens covering a planar extent.
///
/// The corners are converted to degrees and joined into a spherical loop, lifted to the ground
/// elevation found at the upper-right corner. The loop is bounded by a cap whose cell union bound
/// gives at most four cells (six face cells for very large extents). Tokens are truncated to
/// [`MAX_TOKEN_LEN`] characters and deduplicated, keeping the first occurrence.
///
/// Returns an empty list if a corner cannot be converted or the elevation lookup fails.
pub fn derive_covering(extent: &Extent, elevation: &dyn ElevationSource) -> Vec<String> {
    let mut corners = Vec::with_capacity(4);
    for corner in extent.corners() {
        match to_geographic(corner.x, corner.y) {
            Some((lon, lat)) => corners.push(LatLng::from_degrees(lat, lon)),
            None => {
                log::warn!("Extent corner ({}, {}) is not convertible", corner.x, corner.y);
                return vec![];
            }
        }
    }

    let upper_right = &corners[0];
    let (lon, lat) = (upper_right.lng.to_degrees(), upper_right.lat.to_degrees());
    let altitude = match elevation.lookup(lon, lat) {
        Ok(z) => z,
        Err(err) => {
            log::warn!("No elevation for the covering, leaving it empty: {err}");
            return vec![];
        }
    };

    let radius = Datum::WGS84.semimajor() + altitude;
    let lifted = corners.iter().map(|corner| corner.to_point() * radius);
    let cells = SphericalLoop::from_points(lifted).cell_union_bound();

    let mut tokens: Vec<String> = Vec::with_capacity(cells.len());
    for cell in cells {
        let mut token = cell.to_token();
        token.truncate(MAX_TOKEN_LEN);
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevation::ConstantElevation;
    use crate::error::ElevationError;
    use drape_types::geo::to_planar;

    fn planar_extent(lon_lo: f64, lat_lo: f64, lon_hi: f64, lat_hi: f64) -> Extent {
        let (x_min, y_min) = to_planar(lon_lo, lat_lo).expect("in range");
        let (x_max, y_max) = to_planar(lon_hi, lat_hi).expect("in range");
        Extent::new(x_min, y_min, x_max, y_max)
    }

    #[test]
    fn deterministic_and_unique() {
        let extent = planar_extent(-111.05, 45.6, -110.98, 45.7);
        let first = derive_covering(&extent, &ConstantElevation(1500.0));
        assert!(!first.is_empty() && first.len() <= 4);

        for _ in 0..10 {
            assert_eq!(derive_covering(&extent, &ConstantElevation(1500.0)), first);
        }

        for (i, token) in first.iter().enumerate() {
            assert!(token.len() <= MAX_TOKEN_LEN);
            assert!(!first[i + 1..].contains(token));
        }
    }

    #[test]
    fn truncation_collapses_deep_cells() {
        // A single point covers with the deepest cells, whose tokens share their first characters.
        let extent = planar_extent(12.4964, 41.9028, 12.4964, 41.9028);
        let tokens = derive_covering(&extent, &ConstantElevation(20.0));
        assert!(!tokens.is_empty());
        assert!(tokens.len() < 4);
        assert!(tokens.iter().all(|t| t.len() == MAX_TOKEN_LEN));
    }

    #[test]
    fn huge_extent_uses_face_cells() {
        let extent = Extent::new(-20_000_000.0, -19_000_000.0, 20_000_000.0, 19_000_000.0);
        let tokens = derive_covering(&extent, &ConstantElevation(0.0));
        assert_eq!(tokens, vec!["1", "3", "5", "7", "9", "b"]);
    }

    #[test]
    fn elevation_failure_gives_empty_covering() {
        let extent = planar_extent(10.0, 10.0, 11.0, 11.0);
        let missing = |lon: f64, lat: f64| -> Result<f64, ElevationError> {
            Err(ElevationError::ZNotFound { lon, lat })
        };
        assert!(derive_covering(&extent, &missing).is_empty());
    }
}

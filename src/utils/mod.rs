//! Math helpers and map diagnostics.

use crate::{SimError, SimResult};
use ndarray::Array2;

/// Unnormalized isotropic Gaussian, exp(-0.5 (x/sigma)^2).
pub fn gaussian(x: f64, sigma: f64) -> f64 {
    (-0.5 * (x / sigma).powi(2)).exp()
}

/// Number of cells whose activity exceeds a threshold.
///
/// A coarse bump-size diagnostic for the settled field.
pub fn activity_size(activity: &Array2<f64>, threshold: f64) -> usize {
    activity.iter().filter(|&&v| v > threshold).count()
}

/// Assemble the (n·Rn)×(n·Rn) mosaic of per-unit receptive fields.
///
/// Unit (i, j) of the field contributes the Rn×Rn tile at block (i, j);
/// the result is the usual tiled rendering of a topographic map, left to
/// external tooling to display.
///
/// # Errors
/// Returns `ShapeMismatch` if the map is not (n·n, Rn·Rn).
pub fn receptive_field_mosaic(
    map: &Array2<f64>,
    field_size: usize,
    receptor_size: usize,
) -> SimResult<Array2<f64>> {
    let n = field_size;
    let rn = receptor_size;
    if map.dim() != (n * n, rn * rn) {
        return Err(SimError::ShapeMismatch(format!(
            "weight map: expected ({}, {}), got {:?}",
            n * n,
            rn * rn,
            map.dim()
        )));
    }

    let mut mosaic = Array2::zeros((n * rn, n * rn));
    for i in 0..n {
        for j in 0..n {
            let row = map.row(i * n + j);
            for ri in 0..rn {
                for rj in 0..rn {
                    mosaic[[i * rn + ri, j * rn + rj]] = row[ri * rn + rj];
                }
            }
        }
    }
    Ok(mosaic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn gaussian_peaks_at_zero() {
        assert_abs_diff_eq!(gaussian(0.0, 0.1), 1.0, epsilon = 1e-12);
        assert!(gaussian(0.1, 0.1) < 1.0);
        assert_abs_diff_eq!(gaussian(0.1, 0.1), (-0.5f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn activity_size_counts_above_threshold() {
        let mut v = Array2::zeros((3, 3));
        v[[0, 0]] = 0.5;
        v[[1, 1]] = 0.2;
        assert_eq!(activity_size(&v, 0.1), 2);
        assert_eq!(activity_size(&v, 0.3), 1);
        assert_eq!(activity_size(&v, 0.0), 2);
    }

    #[test]
    fn mosaic_places_tiles_by_grid_position() {
        let n = 2;
        let rn = 2;
        let mut map = Array2::zeros((n * n, rn * rn));
        for u in 0..n * n {
            map.row_mut(u).fill(u as f64);
        }

        let mosaic = receptive_field_mosaic(&map, n, rn).unwrap();
        assert_eq!(mosaic.dim(), (n * rn, n * rn));
        // Unit 3 = field cell (1, 1) -> lower-right tile
        assert_abs_diff_eq!(mosaic[[3, 3]], 3.0, epsilon = 1e-12);
        // Unit 1 = field cell (0, 1) -> upper-right tile
        assert_abs_diff_eq!(mosaic[[0, 3]], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn mosaic_rejects_wrong_shape() {
        let map = Array2::zeros((3, 4));
        assert!(receptive_field_mosaic(&map, 2, 2).is_err());
    }
}

//! Receptive-field adaptation.
//!
//! Competitive Hebbian rule without explicit winner selection: each unit
//! moves its receptive field toward the current stimulus in proportion to
//! the excitatory lateral drive it received at the end of integration.
//! The drive is large only near the settled activity bump, so adaptation
//! concentrates there on its own.

use crate::{SimError, SimResult};
use ndarray::{Array2, ArrayView1, Axis, Zip};
use rayon::prelude::*;

/// Pull receptive fields toward the stimulus, gated per unit by the
/// lateral excitatory drive.
///
/// For every field unit `u` (row-major flattening of the n×n grid):
/// ```text
/// W[u] -= lrate * Le[u] * (W[u] - stimulus)
/// ```
///
/// In place, no normalization and no clamping: with a large `lrate * Le`
/// a weight can leave its initialization range. Rows are independent and
/// updated in parallel.
///
/// # Errors
/// Returns `ShapeMismatch` if the excitation grid does not flatten to one
/// entry per map row, or the stimulus length differs from the row length.
pub fn adapt_receptive_fields(
    map: &mut Array2<f64>,
    stimulus: &ArrayView1<f64>,
    excitation: &Array2<f64>,
    lrate: f64,
) -> SimResult<()> {
    let units = excitation.len();
    if map.nrows() != units {
        return Err(SimError::ShapeMismatch(format!(
            "weight map rows: expected {}, got {}",
            units,
            map.nrows()
        )));
    }
    if map.ncols() != stimulus.len() {
        return Err(SimError::ShapeMismatch(format!(
            "stimulus length: expected {}, got {}",
            map.ncols(),
            stimulus.len()
        )));
    }

    let drive: Vec<f64> = excitation.iter().copied().collect();
    map.axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(drive.par_iter())
        .for_each(|(mut row, &le)| {
            let rate = lrate * le;
            Zip::from(&mut row)
                .and(stimulus)
                .for_each(|w, &s| *w -= rate * (*w - s));
        });

    Ok(())
}

//! Stimulus synthesis and precomputed sample banks.
//!
//! A stimulus is the receptor sheet's response to one point contact: a
//! Gaussian of the toroidal distance from each receptor to the contact
//! point. Two banks are drawn up front, one with contact points anywhere
//! on the sheet and one confined to the central region of interest; the
//! driver alternates between them on a fixed schedule.

use crate::data::receptors::ReceptorSheet;
use crate::utils::gaussian;
use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;
use std::f64::consts::SQRT_2;

/// The central region of interest, exclusive on both ends.
const ROI_MIN: f64 = 0.25;
const ROI_MAX: f64 = 0.75;

/// Receptor activation pattern for a contact at (cx, cy).
///
/// Distances are minimum-image on the unit torus, normalized by √2 so the
/// farthest possible contact maps to 1 before the Gaussian is applied.
pub fn stimulus_at(sheet: &ReceptorSheet, cx: f64, cy: f64, extent: f64) -> Array1<f64> {
    let mut sample = Array1::zeros(sheet.len());
    for (k, value) in sample.iter_mut().enumerate() {
        let dx = (sheet.x[k] - cx).abs();
        let dx = dx.min(1.0 - dx);
        let dy = (sheet.y[k] - cy).abs();
        let dy = dy.min(1.0 - dy);
        *value = gaussian((dx * dx + dy * dy).sqrt() / SQRT_2, extent);
    }
    sample
}

/// Does a sample's peak receptor sit inside the region of interest?
///
/// The peak receptor index is mapped back to its nominal grid position
/// (row/Rn, col/Rn); jittered placements keep their nominal cell.
pub fn attention_marker(sample: &ArrayView1<f64>, side: usize) -> bool {
    let mut peak = 0;
    let mut best = f64::NEG_INFINITY;
    for (k, &v) in sample.iter().enumerate() {
        if v > best {
            best = v;
            peak = k;
        }
    }
    let row = (peak / side) as f64 / side as f64;
    let col = (peak % side) as f64 / side as f64;
    row > ROI_MIN && row < ROI_MAX && col > ROI_MIN && col < ROI_MAX
}

/// Precomputed per-epoch stimuli and attention markers.
///
/// One general and one focused sample per epoch; the marker for epoch `e`
/// reflects where the general sample's peak fell, and gates the kernel
/// regime regardless of which bank the driver presents that epoch.
#[derive(Debug, Clone)]
pub struct StimulusBank {
    /// Contact points uniform over the whole sheet, one row per epoch
    pub general: Array2<f64>,
    /// Contact points uniform over the region of interest
    pub focused: Array2<f64>,
    /// Attention marker per epoch
    pub attended: Vec<bool>,
}

impl StimulusBank {
    /// Draw `epochs` samples for each bank.
    pub fn generate<R: Rng>(
        sheet: &ReceptorSheet,
        epochs: usize,
        extent: f64,
        rng: &mut R,
    ) -> Self {
        let count = sheet.len();
        let side = sheet.side();

        let mut general = Array2::zeros((epochs, count));
        for e in 0..epochs {
            let cx = rng.gen_range(0.0..1.0);
            let cy = rng.gen_range(0.0..1.0);
            general
                .row_mut(e)
                .assign(&stimulus_at(sheet, cx, cy, extent));
        }

        let attended = (0..epochs)
            .map(|e| attention_marker(&general.row(e), side))
            .collect();

        let mut focused = Array2::zeros((epochs, count));
        for e in 0..epochs {
            let cx = rng.gen_range(ROI_MIN..ROI_MAX);
            let cy = rng.gen_range(ROI_MIN..ROI_MAX);
            focused
                .row_mut(e)
                .assign(&stimulus_at(sheet, cx, cy, extent));
        }

        Self {
            general,
            focused,
            attended,
        }
    }

    /// Number of epochs the banks cover.
    pub fn len(&self) -> usize {
        self.attended.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attended.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn flat_sheet(side: usize) -> ReceptorSheet {
        let mut rng = StdRng::seed_from_u64(0);
        ReceptorSheet::regular(side, 0.0, &mut rng)
    }

    #[test]
    fn stimulus_peaks_at_the_contacted_receptor() {
        let sheet = flat_sheet(8);
        let sample = stimulus_at(&sheet, 0.25, 0.5, 0.08);

        let mut peak = 0;
        let mut best = f64::NEG_INFINITY;
        for (k, &v) in sample.iter().enumerate() {
            if v > best {
                best = v;
                peak = k;
            }
        }
        // Receptor at exactly (0.25, 0.5) is row 4, col 2
        assert_eq!(peak, 4 * 8 + 2);
        assert!((best - 1.0).abs() < 1e-12);
    }

    #[test]
    fn stimulus_wraps_around_the_torus() {
        let sheet = flat_sheet(8);
        let sample = stimulus_at(&sheet, 0.0, 0.0, 0.08);
        // Receptors one step left of and one step right of the contact
        // are equidistant on the torus.
        let right = sample[1];
        let wrapped = sample[7];
        assert!((right - wrapped).abs() < 1e-12);
    }

    #[test]
    fn central_peak_is_marked_attended() {
        let side = 4;
        let mut sample = arr1(&[0.0; 16]);
        // Receptor (2, 2) has nominal position (0.5, 0.5)
        sample[2 * side + 2] = 1.0;
        assert!(attention_marker(&sample.view(), side));

        let mut corner = arr1(&[0.0; 16]);
        corner[0] = 1.0;
        assert!(!attention_marker(&corner.view(), side));
    }

    #[test]
    fn banks_cover_every_epoch() {
        let sheet = flat_sheet(8);
        let mut rng = StdRng::seed_from_u64(5);
        let bank = StimulusBank::generate(&sheet, 12, 0.08, &mut rng);

        assert_eq!(bank.len(), 12);
        assert_eq!(bank.general.dim(), (12, 64));
        assert_eq!(bank.focused.dim(), (12, 64));
        assert!(bank.general.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn markers_match_general_samples() {
        let sheet = flat_sheet(8);
        let mut rng = StdRng::seed_from_u64(5);
        let bank = StimulusBank::generate(&sheet, 32, 0.08, &mut rng);

        for e in 0..bank.len() {
            assert_eq!(
                bank.attended[e],
                attention_marker(&bank.general.row(e), sheet.side())
            );
        }
    }
}

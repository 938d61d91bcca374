//! The per-epoch simulation driver.
//!
//! Every epoch runs the same sequence against the shared weight map:
//!
//! 1. Pick the stimulus: the focused bank every `roi_frequency` epochs,
//!    the general bank otherwise.
//! 2. Pick the kernel regime from the epoch's attention marker.
//! 3. Compute the feed-forward drive from the map's similarity to the
//!    stimulus — the evolving map feeds back into the field dynamics
//!    every epoch, so epochs must run strictly in order.
//! 4. Integrate the field from fresh noise for the fixed duration.
//! 5. Adapt the receptive fields with the settled excitatory drive.
//! 6. Drop the field state; the next epoch starts cold.
//!
//! Only the per-unit work inside one epoch is parallel (the drive and the
//! weight update); there is no parallelism across epochs, because each
//! epoch reads the map the previous one wrote.

use crate::data::samples::StimulusBank;
use crate::field::{FieldIntegrator, FieldState};
use crate::kernel::{KernelSet, KernelVariant};
use crate::learning::adapt_receptive_fields;
use crate::utils::activity_size;
use crate::{SimError, SimResult, SimulationConfig};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

/// Metrics for one completed epoch, one JSONL event per entry.
#[derive(Debug, Clone, Serialize)]
pub struct EpochReport {
    pub epoch: usize,
    /// Kernel regime the epoch ran under
    pub kernel: KernelVariant,
    /// Whether the stimulus came from the focused (region-of-interest) bank
    pub focused: bool,
    /// Peak excitatory lateral drive at the settled state
    pub peak_excitation: f64,
    /// Mean feed-forward drive into the field
    pub mean_drive: f64,
    /// Cells with positive settled activity
    pub active_units: usize,
}

// ============================================================================
// Feed-forward drive
// ============================================================================

/// Feed-forward drive of every field unit for one stimulus.
///
/// A unit whose receptive field already resembles the stimulus gets a
/// stronger drive: `Input[u] = (1 - mean|W[u] - stimulus|) * alpha`,
/// reshaped to the n×n grid. Rows are independent and evaluated in
/// parallel.
///
/// # Errors
/// Returns `ShapeMismatch` if the map does not hold n·n rows of the
/// stimulus length.
pub fn input_drive(
    map: &ArrayView2<f64>,
    stimulus: &ArrayView1<f64>,
    n: usize,
    alpha: f64,
) -> SimResult<Array2<f64>> {
    if map.nrows() != n * n {
        return Err(SimError::ShapeMismatch(format!(
            "weight map rows: expected {}, got {}",
            n * n,
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

    let len = stimulus.len() as f64;
    let values: Vec<f64> = map
        .axis_iter(Axis(0))
        .into_par_iter()
        .map(|row| {
            let distance: f64 = row
                .iter()
                .zip(stimulus.iter())
                .map(|(w, s)| (w - s).abs())
                .sum::<f64>()
                / len;
            (1.0 - distance) * alpha
        })
        .collect();

    Array2::from_shape_vec((n, n), values)
        .map_err(|e| SimError::ShapeMismatch(format!("input drive reshape: {}", e)))
}

// ============================================================================
// Driver
// ============================================================================

/// Owns the immutable kernel pairs, the integrator and the RNG stream;
/// sequences the epochs of a run.
pub struct Trainer {
    config: SimulationConfig,
    kernels: KernelSet,
    integrator: FieldIntegrator,
    rng: StdRng,
}

impl Trainer {
    /// Validate the config and build both kernel regimes.
    ///
    /// Seeds the RNG from `config.seed`; use [`with_rng`](Self::with_rng)
    /// to continue an existing stream (e.g. after drawing the receptor
    /// sheet and the stimulus banks from it).
    ///
    /// # Errors
    /// Returns `InvalidConfig` for a rejected parameter set.
    pub fn new(config: SimulationConfig) -> SimResult<Self> {
        let rng = StdRng::seed_from_u64(config.seed);
        Self::with_rng(config, rng)
    }

    /// Like [`new`](Self::new) but with a caller-provided RNG stream.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for a rejected parameter set.
    pub fn with_rng(config: SimulationConfig, rng: StdRng) -> SimResult<Self> {
        config.validate()?;
        let integrator = FieldIntegrator::new(
            config.field_size,
            config.duration,
            config.dt,
            config.tau,
        )?;
        let kernels = KernelSet::build(&config, integrator.transform())?;
        Ok(Self {
            config,
            kernels,
            integrator,
            rng,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Fresh random weight map in [weight_min, weight_max].
    pub fn fresh_map(&mut self) -> Array2<f64> {
        use ndarray_rand::rand_distr::Uniform;
        use ndarray_rand::RandomExt;
        let n = self.config.field_size;
        let rn = self.config.receptor_size;
        Array2::random_using(
            (n * n, rn * rn),
            Uniform::new_inclusive(self.config.weight_min, self.config.weight_max),
            &mut self.rng,
        )
    }

    /// Run one training epoch against the shared weight map.
    ///
    /// # Errors
    /// - `ShapeMismatch` if the map or bank disagree with the config
    /// - `InvalidConfig` if `epoch` is outside the bank
    /// - `Diverged` if the field blows up — fatal, never retried, since
    ///   identical parameters reproduce the failure
    pub fn train_epoch(
        &mut self,
        map: &mut Array2<f64>,
        bank: &StimulusBank,
        epoch: usize,
    ) -> SimResult<EpochReport> {
        let n = self.config.field_size;
        if epoch >= bank.len() {
            return Err(SimError::InvalidConfig(format!(
                "epoch {} outside stimulus bank of length {}",
                epoch,
                bank.len()
            )));
        }

        let focused = epoch % self.config.roi_frequency == 0;
        let stimulus = if focused {
            bank.focused.row(epoch)
        } else {
            bank.general.row(epoch)
        };
        let kernel = if bank.attended[epoch] {
            KernelVariant::Attentional
        } else {
            KernelVariant::Normal
        };

        let drive = input_drive(&map.view(), &stimulus, n, self.config.alpha)?;

        let mut state = FieldState::noisy(n, &mut self.rng);
        let excitation = self
            .integrator
            .integrate(&mut state, &drive, self.kernels.pair(kernel))
            .map_err(|e| match e {
                SimError::Diverged(msg) => {
                    SimError::Diverged(format!("epoch {}: {}", epoch, msg))
                }
                other => other,
            })?;

        adapt_receptive_fields(map, &stimulus, &excitation, self.config.lrate)?;

        let peak_excitation = excitation.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Ok(EpochReport {
            epoch,
            kernel,
            focused,
            peak_excitation,
            mean_drive: drive.mean().unwrap_or(0.0),
            active_units: activity_size(&state.v, 0.0),
        })
    }
}

//! # DNF-SOM (Dynamic Neural Field Self-Organizing Map)
//!
//! Simulation of cortical receptive-field map formation under a dynamic
//! neural field model with attention-modulated lateral interactions.
//!
//! ## Overview
//!
//! An n×n sheet of field units sits on a toroidal grid. Each unit carries a
//! receptive field over an Rn×Rn sheet of skin receptors. Per training
//! epoch a tactile stimulus drives the field, recurrent lateral interaction
//! (computed spectrally) settles into an activity bump, and a competitive
//! learning rule pulls the receptive fields of the active units toward the
//! stimulus. An attentional marker switches the lateral kernels to a
//! higher-gain variant, selectively sharpening learning inside a region of
//! interest.
//!
//! ## Structure
//!
//! - [`spectral`] — 2D FFT plumbing for periodic convolution
//! - [`kernel`] — lateral interaction kernels and their spectra
//! - [`field`] — leaky-integrator field dynamics
//! - [`learning`] — receptive-field adaptation rule
//! - [`data`] — receptor sheet and stimulus banks
//! - [`training`] — the per-epoch simulation driver
//! - [`checkpoint`] — weight-map snapshots and receptor layouts
//! - [`utils`] — math helpers and diagnostics

pub mod checkpoint;
pub mod data;
pub mod field;
pub mod kernel;
pub mod learning;
pub mod spectral;
pub mod training;
pub mod utils;

pub use data::receptors::ReceptorSheet;
pub use data::samples::StimulusBank;
pub use field::{FieldIntegrator, FieldState};
pub use kernel::{KernelPair, KernelSet, KernelVariant};
pub use learning::adapt_receptive_fields;
pub use spectral::Fft2d;
pub use training::{EpochReport, Trainer};

use std::error::Error;
use std::fmt;

/// Error type for simulation operations.
#[derive(Debug, Clone)]
pub enum SimError {
    /// Invalid simulation parameters
    InvalidConfig(String),
    /// Shape mismatch between arrays
    ShapeMismatch(String),
    /// Numeric divergence (NaN/Inf) during field integration
    Diverged(String),
    /// Snapshot or layout persistence failure
    Snapshot(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            SimError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            SimError::Diverged(msg) => write!(f, "Field diverged: {}", msg),
            SimError::Snapshot(msg) => write!(f, "Snapshot error: {}", msg),
        }
    }
}

impl Error for SimError {}

pub type SimResult<T> = Result<T, SimError>;

/// Simulation parameters.
///
/// Defaults reproduce the published long-term gain-modulation experiment:
/// a 32×32 field over a 16×16 receptor sheet, trained for 35000 epochs
/// with every second stimulus drawn from the central region of interest.
///
/// Lateral kernel strengths scale as `960 / n²` so total lateral drive
/// stays comparable across grid sizes.
///
/// ## Stability
///
/// The explicit Euler step is stable only while `dt * tau` stays below the
/// bound implied by the kernel gains (the spectral radius of the lateral
/// operator). The integrator detects divergence after the fact — NaN/Inf
/// is fatal — but applies no step control.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Field grid side n (the field has n×n units)
    pub field_size: usize,
    /// Receptor grid side Rn (receptive fields have Rn×Rn entries)
    pub receptor_size: usize,
    /// Receptor placement jitter, in sheet coordinates
    pub receptor_noise: f64,
    /// Simulated integration duration per epoch
    pub duration: f64,
    /// Euler step size
    pub dt: f64,
    /// Synaptic temporal decay constant
    pub tau: f64,
    /// Gain applied to both the feed-forward drive and the lateral kernels
    pub alpha: f64,
    /// Learning rate for the receptive-field update
    pub lrate: f64,
    /// Number of training epochs
    pub epochs: usize,
    /// Present a region-of-interest stimulus every this many epochs
    pub roi_frequency: usize,
    /// Strength of lateral excitation (normal regime)
    pub excit_strength: f64,
    /// Spatial extent of lateral excitation
    pub excit_extent: f64,
    /// Strength of lateral inhibition (normal regime)
    pub inhib_strength: f64,
    /// Spatial extent of lateral inhibition
    pub inhib_extent: f64,
    /// Strength of lateral excitation under attention
    pub excit_strength_attn: f64,
    /// Strength of lateral inhibition under attention
    pub inhib_strength_attn: f64,
    /// Spatial extent of a stimulus on the receptor sheet
    pub stimulus_extent: f64,
    /// Lower bound for fresh weight initialization
    pub weight_min: f64,
    /// Upper bound for fresh weight initialization
    pub weight_max: f64,
    /// RNG seed for receptor jitter, stimulus sampling and field resets
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let n = 32usize;
        let base = 960.0 / (n * n) as f64;
        Self {
            field_size: n,
            receptor_size: 16,
            receptor_noise: 0.05,
            duration: 10.0,
            dt: 0.1,
            tau: 1.0,
            alpha: 0.1,
            lrate: 0.4,
            epochs: 35000,
            roi_frequency: 2,
            excit_strength: base * 3.72,
            excit_extent: 0.1,
            inhib_strength: base * 2.40,
            inhib_extent: 1.0,
            excit_strength_attn: base * 8.00,
            inhib_strength_attn: base * 6.10,
            stimulus_extent: 0.08,
            weight_min: 0.0,
            weight_max: 1.0,
            seed: 137,
        }
    }
}

impl SimulationConfig {
    /// Validate the parameter set.
    ///
    /// Rejects non-positive sizes, extents and time constants, negative
    /// kernel strengths, and a duration that is not an integer multiple of
    /// the step size. The fixed iteration count is `duration / dt`; a
    /// non-exact ratio is a configuration error, not something to round.
    ///
    /// # Errors
    /// Returns `InvalidConfig` naming the offending parameter.
    pub fn validate(&self) -> SimResult<()> {
        if self.field_size == 0 {
            return Err(SimError::InvalidConfig(
                "field_size must be > 0".to_string(),
            ));
        }
        if self.receptor_size == 0 {
            return Err(SimError::InvalidConfig(
                "receptor_size must be > 0".to_string(),
            ));
        }
        if self.receptor_noise < 0.0 {
            return Err(SimError::InvalidConfig(
                "receptor_noise must be >= 0".to_string(),
            ));
        }
        if self.duration <= 0.0 || self.dt <= 0.0 || self.tau <= 0.0 {
            return Err(SimError::InvalidConfig(
                "duration, dt and tau must be > 0".to_string(),
            ));
        }
        let ratio = self.duration / self.dt;
        if (ratio - ratio.round()).abs() > 1e-9 * ratio.max(1.0) || ratio.round() < 1.0 {
            return Err(SimError::InvalidConfig(format!(
                "duration {} is not an integer multiple of dt {}",
                self.duration, self.dt
            )));
        }
        if self.alpha <= 0.0 {
            return Err(SimError::InvalidConfig("alpha must be > 0".to_string()));
        }
        if self.lrate <= 0.0 {
            return Err(SimError::InvalidConfig("lrate must be > 0".to_string()));
        }
        if self.roi_frequency == 0 {
            return Err(SimError::InvalidConfig(
                "roi_frequency must be > 0".to_string(),
            ));
        }
        if self.excit_extent <= 0.0 || self.inhib_extent <= 0.0 || self.stimulus_extent <= 0.0 {
            return Err(SimError::InvalidConfig(
                "kernel and stimulus extents must be > 0".to_string(),
            ));
        }
        if self.excit_strength < 0.0
            || self.inhib_strength < 0.0
            || self.excit_strength_attn < 0.0
            || self.inhib_strength_attn < 0.0
        {
            return Err(SimError::InvalidConfig(
                "kernel strengths must be >= 0".to_string(),
            ));
        }
        if self.weight_min > self.weight_max {
            return Err(SimError::InvalidConfig(
                "weight_min must not exceed weight_max".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of Euler iterations per epoch. Call after [`validate`](Self::validate).
    pub fn integration_steps(&self) -> usize {
        (self.duration / self.dt).round() as usize
    }

    /// Lateral kernel parameters for the normal regime.
    pub fn normal_kernels(&self) -> kernel::LateralParams {
        kernel::LateralParams {
            excit_strength: self.excit_strength,
            excit_extent: self.excit_extent,
            inhib_strength: self.inhib_strength,
            inhib_extent: self.inhib_extent,
            gain: self.alpha,
        }
    }

    /// Lateral kernel parameters for the attentional regime. Only the
    /// strengths differ from the normal regime.
    pub fn attentional_kernels(&self) -> kernel::LateralParams {
        kernel::LateralParams {
            excit_strength: self.excit_strength_attn,
            excit_extent: self.excit_extent,
            inhib_strength: self.inhib_strength_attn,
            inhib_extent: self.inhib_extent,
            gain: self.alpha,
        }
    }
}

//! Lateral interaction kernels.
//!
//! Each field unit excites near neighbors and inhibits a wider surround.
//! Both profiles are isotropic Gaussians of the toroidal distance to the
//! grid centre, scaled by a strength constant and the global gain. For the
//! spectral convolution to be spatially aligned, the kernel is circularly
//! shifted so its peak sits at index [0,0] (the zero-lag position of a
//! periodic correlation) before it is transformed.
//!
//! Two immutable kernel pairs exist per run: the normal pair and a
//! higher-gain attentional pair. They are built once at startup and
//! selected per epoch by the attention marker.

use crate::spectral::Fft2d;
use crate::utils::gaussian;
use crate::{SimError, SimResult};
use ndarray::Array2;
use rustfft::num_complex::Complex;
use serde::Serialize;

/// Strengths and extents for one excitatory/inhibitory kernel pair.
#[derive(Debug, Clone, Copy)]
pub struct LateralParams {
    pub excit_strength: f64,
    pub excit_extent: f64,
    pub inhib_strength: f64,
    pub inhib_extent: f64,
    /// Overall gain applied to both profiles
    pub gain: f64,
}

impl LateralParams {
    fn validate(&self) -> SimResult<()> {
        if self.excit_extent <= 0.0 || self.inhib_extent <= 0.0 {
            return Err(SimError::InvalidConfig(
                "kernel extents must be > 0".to_string(),
            ));
        }
        if self.excit_strength < 0.0 || self.inhib_strength < 0.0 {
            return Err(SimError::InvalidConfig(
                "kernel strengths must be >= 0".to_string(),
            ));
        }
        if self.gain <= 0.0 {
            return Err(SimError::InvalidConfig("kernel gain must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Which lateral regime an epoch runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelVariant {
    Normal,
    Attentional,
}

/// Frequency-domain excitatory/inhibitory kernel pair.
///
/// Read-only after construction; shared by every integration step.
pub struct KernelPair {
    pub excitatory: Array2<Complex<f64>>,
    pub inhibitory: Array2<Complex<f64>>,
}

impl KernelPair {
    /// Build the spectra for one parameter set.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for a zero grid or invalid strengths/extents.
    pub fn build(n: usize, params: &LateralParams, fft: &Fft2d) -> SimResult<Self> {
        if n == 0 {
            return Err(SimError::InvalidConfig(
                "kernel grid side must be > 0".to_string(),
            ));
        }
        params.validate()?;

        let excit = shift_zero_lag(&lateral_kernel(
            n,
            params.excit_strength,
            params.excit_extent,
            params.gain,
        ));
        let inhib = shift_zero_lag(&lateral_kernel(
            n,
            params.inhib_strength,
            params.inhib_extent,
            params.gain,
        ));

        Ok(Self {
            excitatory: fft.forward(&excit),
            inhibitory: fft.forward(&inhib),
        })
    }
}

/// Both kernel regimes for a run.
pub struct KernelSet {
    normal: KernelPair,
    attentional: KernelPair,
}

impl KernelSet {
    /// Build the normal and attentional pairs from a config.
    pub fn build(config: &crate::SimulationConfig, fft: &Fft2d) -> SimResult<Self> {
        let n = config.field_size;
        Ok(Self {
            normal: KernelPair::build(n, &config.normal_kernels(), fft)?,
            attentional: KernelPair::build(n, &config.attentional_kernels(), fft)?,
        })
    }

    pub fn pair(&self, variant: KernelVariant) -> &KernelPair {
        match variant {
            KernelVariant::Normal => &self.normal,
            KernelVariant::Attentional => &self.attentional,
        }
    }
}

/// Spatial Gaussian kernel centred on the grid.
///
/// Cell (i, j) sits at ((j+1)/n, (i+1)/n) on the unit torus; its value is
/// `strength * gain * exp(-0.5 (d/sigma)^2)` where d is the toroidal
/// Euclidean distance to the centre (0.5, 0.5).
pub fn lateral_kernel(n: usize, strength: f64, sigma: f64, gain: f64) -> Array2<f64> {
    let side = n as f64;
    Array2::from_shape_fn((n, n), |(i, j)| {
        let dx = ((j + 1) as f64 / side - 0.5).abs();
        let dx = dx.min(1.0 - dx);
        let dy = ((i + 1) as f64 / side - 0.5).abs();
        let dy = dy.min(1.0 - dy);
        strength * gain * gaussian((dx * dx + dy * dy).sqrt(), sigma)
    })
}

/// Circularly shift a kernel so its peak lands on index [0,0].
///
/// A periodic convolution computed through the transform pair treats
/// index [0,0] as zero lag; transforming the centred kernel directly
/// would displace every interaction by half the grid.
pub fn shift_zero_lag(kernel: &Array2<f64>) -> Array2<f64> {
    let (rows, cols) = kernel.dim();
    let mut peak = (0usize, 0usize);
    let mut best = f64::NEG_INFINITY;
    for ((i, j), &v) in kernel.indexed_iter() {
        if v > best {
            best = v;
            peak = (i, j);
        }
    }
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        kernel[[(i + peak.0) % rows, (j + peak.1) % cols]]
    })
}

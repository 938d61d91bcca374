//! Dynamic neural field integration.
//!
//! This module provides the field state representation and the fixed-step
//! integrator:
//! - Leaky-integrator membrane dynamics with rectified activity
//! - Lateral interaction via spectral (circular) convolution
//! - Fixed simulated duration, no convergence tolerance
//!
//! ## Dynamics
//!
//! The field integrates, per Euler step:
//! ```text
//! U += (-U + (Le - Li) + Input) * tau * dt
//! V  = max(U, 0)
//!
//! where Le = F⁻¹(F(V) ∘ We_fft), Li = F⁻¹(F(V) ∘ Wi_fft)
//! ```
//!
//! U is the raw membrane potential, V the rectified activity that feeds
//! back through the lateral kernels. The rectification is the field's
//! nonlinearity: negative potentials produce no lateral drive.

use crate::kernel::KernelPair;
use crate::spectral::Fft2d;
use crate::{SimError, SimResult};
use ndarray::{azip, Array2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

/// Per-epoch field state.
///
/// Owned by one integration run and discarded afterwards; every epoch
/// starts from fresh low-amplitude noise, so no activity carries over
/// between epochs.
#[derive(Debug, Clone)]
pub struct FieldState {
    /// Raw membrane potential (may be negative)
    pub u: Array2<f64>,
    /// Rectified activity, max(U, 0)
    pub v: Array2<f64>,
}

impl FieldState {
    /// Fresh state with both arrays drawn from U(0, 0.01).
    pub fn noisy<R: Rng>(n: usize, rng: &mut R) -> Self {
        let dist = Uniform::new(0.0, 0.01);
        Self {
            u: Array2::random_using((n, n), dist, rng),
            v: Array2::random_using((n, n), dist, rng),
        }
    }

    /// All-zero state of the given side length.
    pub fn zeros(n: usize) -> Self {
        Self {
            u: Array2::zeros((n, n)),
            v: Array2::zeros((n, n)),
        }
    }
}

/// Fixed-duration explicit Euler integrator for the field equation.
pub struct FieldIntegrator {
    n: usize,
    dt: f64,
    tau: f64,
    steps: usize,
    transform: Fft2d,
}

impl FieldIntegrator {
    /// Create an integrator for an n×n field.
    ///
    /// The iteration count is `duration / dt`, which must divide evenly;
    /// a non-integer ratio is rejected rather than silently truncated.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for a zero grid, non-positive time
    /// constants, or a non-divisible duration.
    pub fn new(n: usize, duration: f64, dt: f64, tau: f64) -> SimResult<Self> {
        if n == 0 {
            return Err(SimError::InvalidConfig(
                "field side must be > 0".to_string(),
            ));
        }
        if duration <= 0.0 || dt <= 0.0 || tau <= 0.0 {
            return Err(SimError::InvalidConfig(
                "duration, dt and tau must be > 0".to_string(),
            ));
        }
        let ratio = duration / dt;
        if (ratio - ratio.round()).abs() > 1e-9 * ratio.max(1.0) || ratio.round() < 1.0 {
            return Err(SimError::InvalidConfig(format!(
                "duration {} is not an integer multiple of dt {}",
                duration, dt
            )));
        }
        Ok(Self {
            n,
            dt,
            tau,
            steps: ratio.round() as usize,
            transform: Fft2d::new(n),
        })
    }

    /// Field side length.
    pub fn size(&self) -> usize {
        self.n
    }

    /// Number of Euler iterations per integration run.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// The FFT plans, shared with kernel construction.
    pub fn transform(&self) -> &Fft2d {
        &self.transform
    }

    /// Advance the field by one Euler step and return the excitatory
    /// lateral drive of that step.
    pub fn step(
        &self,
        state: &mut FieldState,
        input: &Array2<f64>,
        kernels: &KernelPair,
    ) -> Array2<f64> {
        let spectrum = self.transform.forward(&state.v);
        let excitation = self
            .transform
            .inverse_real(&(&spectrum * &kernels.excitatory));
        let inhibition = self
            .transform
            .inverse_real(&(&spectrum * &kernels.inhibitory));

        let gain = self.tau * self.dt;
        azip!((u in &mut state.u, &le in &excitation, &li in &inhibition, &inp in input) {
            *u += (-*u + (le - li) + inp) * gain;
        });
        azip!((v in &mut state.v, &u in &state.u) *v = u.max(0.0));

        excitation
    }

    /// Integrate the field for the fixed simulated duration.
    ///
    /// Returns the excitatory lateral drive of the **last** step: the
    /// learning signal is the excitation evaluated at the settled state,
    /// not a value recomputed afterwards.
    ///
    /// There is no convergence check; the loop always runs the full
    /// iteration count. A non-finite potential at the end of the run is a
    /// fatal [`SimError::Diverged`] — an ill-chosen `dt * tau` against the
    /// kernel gains reproduces the same failure on retry, so none is
    /// attempted.
    ///
    /// # Errors
    /// - `ShapeMismatch` if state or input do not match the grid
    /// - `Diverged` if the final potential contains NaN/Inf
    pub fn integrate(
        &self,
        state: &mut FieldState,
        input: &Array2<f64>,
        kernels: &KernelPair,
    ) -> SimResult<Array2<f64>> {
        let shape = (self.n, self.n);
        if state.u.dim() != shape || state.v.dim() != shape {
            return Err(SimError::ShapeMismatch(format!(
                "field state: expected {:?}, got {:?}",
                shape,
                state.u.dim()
            )));
        }
        if input.dim() != shape {
            return Err(SimError::ShapeMismatch(format!(
                "input drive: expected {:?}, got {:?}",
                shape,
                input.dim()
            )));
        }

        let mut excitation = Array2::zeros(shape);
        for _ in 0..self.steps {
            excitation = self.step(state, input, kernels);
        }

        if !state.u.iter().all(|v| v.is_finite()) {
            return Err(SimError::Diverged(format!(
                "non-finite potential after {} steps (dt*tau = {})",
                self.steps,
                self.dt * self.tau
            )));
        }
        Ok(excitation)
    }
}

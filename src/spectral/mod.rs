//! 2D spectral transforms for periodic convolution.
//!
//! The field and its lateral kernels live on a toroidal grid, so lateral
//! interaction is a circular convolution: forward-transform the activity,
//! multiply by the kernel spectrum, inverse-transform the product. The
//! transforms here are separable row/column passes of a planned 1D FFT.

use ndarray::Array2;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Planned forward/inverse FFTs for an n×n grid.
///
/// Plans are built once and reused for every integration step; `rustfft`
/// caches twiddle factors inside the plan.
pub struct Fft2d {
    n: usize,
    fwd: Arc<dyn Fft<f64>>,
    inv: Arc<dyn Fft<f64>>,
}

impl Fft2d {
    /// Plan transforms for an n×n grid.
    pub fn new(n: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fwd = planner.plan_fft_forward(n);
        let inv = planner.plan_fft_inverse(n);
        Self { n, fwd, inv }
    }

    /// Grid side length the plans were built for.
    pub fn size(&self) -> usize {
        self.n
    }

    /// Forward transform of a real n×n array.
    pub fn forward(&self, real: &Array2<f64>) -> Array2<Complex<f64>> {
        let mut data = real.mapv(|v| Complex::new(v, 0.0));
        self.transform(&mut data, &self.fwd);
        data
    }

    /// Inverse transform of an n×n spectrum, returning the real part.
    ///
    /// `rustfft` leaves the inverse unnormalized; the 1/n² factor is
    /// applied here.
    pub fn inverse_real(&self, spectrum: &Array2<Complex<f64>>) -> Array2<f64> {
        let mut data = spectrum.clone();
        self.transform(&mut data, &self.inv);
        let scale = 1.0 / (self.n * self.n) as f64;
        data.mapv(|c| c.re * scale)
    }

    /// Separable 2D pass: FFT each row, then each column through a buffer.
    fn transform(&self, data: &mut Array2<Complex<f64>>, fft: &Arc<dyn Fft<f64>>) {
        let n = self.n;

        let mut row_buffer = vec![Complex::new(0.0, 0.0); n];
        for mut row in data.rows_mut() {
            for (dst, src) in row_buffer.iter_mut().zip(row.iter()) {
                *dst = *src;
            }
            fft.process(&mut row_buffer);
            for (dst, src) in row.iter_mut().zip(row_buffer.iter()) {
                *dst = *src;
            }
        }

        let mut col_buffer = vec![Complex::new(0.0, 0.0); n];
        for col in 0..n {
            for row in 0..n {
                col_buffer[row] = data[[row, col]];
            }
            fft.process(&mut col_buffer);
            for row in 0..n {
                data[[row, col]] = col_buffer[row];
            }
        }
    }
}

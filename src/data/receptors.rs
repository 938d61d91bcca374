//! Skin receptor placement.

use ndarray::Array1;
use rand::Rng;

/// Rn×Rn receptors on the unit torus, stored flat in row-major order.
///
/// Receptors start on a regular grid and get a uniform jitter of up to
/// `noise` in each coordinate, wrapped back into [0, 1). The layout is
/// fixed for a whole run (and across runs when reloaded from disk), since
/// the pretrained weight map is only meaningful against the layout it was
/// trained on.
#[derive(Debug, Clone)]
pub struct ReceptorSheet {
    side: usize,
    pub x: Array1<f64>,
    pub y: Array1<f64>,
}

impl ReceptorSheet {
    /// Jittered regular grid with `side`×`side` receptors.
    pub fn regular<R: Rng>(side: usize, noise: f64, rng: &mut R) -> Self {
        let count = side * side;
        let step = 1.0 / side as f64;
        let mut x = Array1::zeros(count);
        let mut y = Array1::zeros(count);
        for i in 0..side {
            for j in 0..side {
                let k = i * side + j;
                let jx = rng.gen_range(-noise..=noise);
                let jy = rng.gen_range(-noise..=noise);
                x[k] = (j as f64 * step + jx).rem_euclid(1.0);
                y[k] = (i as f64 * step + jy).rem_euclid(1.0);
            }
        }
        Self { side, x, y }
    }

    /// Rebuild a sheet from stored coordinate arrays.
    pub fn from_coords(side: usize, x: Array1<f64>, y: Array1<f64>) -> Option<Self> {
        if x.len() != side * side || y.len() != side * side {
            return None;
        }
        Some(Self { side, x, y })
    }

    /// Receptor grid side Rn.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Total receptor count Rn².
    pub fn len(&self) -> usize {
        self.side * self.side
    }

    pub fn is_empty(&self) -> bool {
        self.side == 0
    }
}

//! Receptor layout and stimulus generation.
//!
//! - [`receptors`] — jittered regular grid of skin receptors on the unit torus
//! - [`samples`] — precomputed stimulus banks and attention markers

pub mod receptors;
pub mod samples;

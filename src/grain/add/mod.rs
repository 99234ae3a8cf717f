//! # Additive Grain
//!
//! Gaussian noise added directly to the samples, with the variance given in
//! 8-bit units.

mod grainer;

pub use grainer::AddGrain;

// Add-specific parameter names
pub const SEED: &str = "seed";
pub const CONSTANT: &str = "constant";

//! # Placebo Grain
//!
//! Uniform dithering grain as produced by a zero-threshold deband pass.

mod grainer;

pub use grainer::PlaceboGrain;

pub const SEED: &str = "seed";

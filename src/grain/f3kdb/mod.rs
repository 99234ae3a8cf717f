//! # F3kdb Grain
//!
//! Integer-strength grain as produced by a minimal-threshold f3kdb deband pass.

mod grainer;

pub use grainer::{F3kdbGrain, RandomAlgorithm};

pub const SEED: &str = "seed";
pub const DYNAMIC_GRAIN: &str = "dynamic_grain";
pub const RANDOM_ALGO_GRAIN: &str = "random_algo_grain";

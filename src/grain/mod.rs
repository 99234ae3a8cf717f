//! # Grain Algorithm System
//!
//! Pluggable noise generators used to build each band's grain layer. A
//! grainer takes a frame and a luma/chroma strength pair and returns a noised
//! copy; anything else it needs is captured when it is constructed.
//!
//! ## Built-in Grainers
//!
//! - **add**: Gaussian grain, variance in 8-bit units
//! - **placebo**: Uniform dithering grain of a zero-threshold deband
//! - **f3kdb**: Integer-strength deband grain, uniform or gaussian
//!
//! ## Usage
//!
//! ```rust,no_run
//! use luma_grain::grain::{GrainerConfig, GrainerRegistry};
//!
//! let registry = GrainerRegistry::new();
//! let grainer = registry.create(&GrainerConfig::named("add").set("seed", 42)).unwrap();
//! ```

pub mod noise;
pub mod registry;
pub mod traits;

// Grainer implementations
pub mod add;
pub mod f3kdb;
pub mod placebo;

// Re-exports for convenience
pub use registry::GrainerRegistry;
pub use traits::{ConfigValue, Grainer, GrainerConfig, GrainerMetadata, Strength};

pub use add::AddGrain;
pub use f3kdb::F3kdbGrain;
pub use placebo::PlaceboGrain;

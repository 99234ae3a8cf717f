//! # Luma-Grain
//!
//! Luma-adaptive multi-band film grain for decoded video frames.
//!
//! The luma range of a frame is split into bands at configurable thresholds.
//! Each band gets its own grain layer (strength, grain size, sharpness and
//! noise generator) and only shows where the frame's luma falls in that band.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use luma_grain::{config::Config, grain::GrainerRegistry, video::Frame};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let graigasm = config.build_graigasm(&GrainerRegistry::new())?;
//!
//! let image = image::open("frame.png")?;
//! let frame = Frame::from_dynamic_image(&image)?;
//! let grained = graigasm.apply(&frame)?;
//! grained.to_dynamic_image()?.save("grained.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`video`] - Planar frames, formats, resampling and difference ops
//! - [`grain`] - Noise generators behind the [`Grainer`](grain::Grainer) trait
//! - [`graigasm`] - Band masks, grain layers and compositing
//! - [`config`] - TOML configuration
//!
//! ## Custom Grainers
//!
//! Any noise generator can drive a band by implementing
//! [`Grainer`](grain::Grainer) and registering it:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use luma_grain::grain::{Grainer, GrainerRegistry, Strength};
//! use luma_grain::video::Frame;
//! use luma_grain::Result;
//!
//! #[derive(Debug)]
//! struct Silent;
//!
//! impl Grainer for Silent {
//!     fn name(&self) -> &str {
//!         "silent"
//!     }
//!
//!     fn description(&self) -> &str {
//!         "Returns the frame untouched"
//!     }
//!
//!     fn grain(&self, frame: &Frame, _strength: Strength) -> Result<Frame> {
//!         Ok(frame.clone())
//!     }
//! }
//!
//! let mut registry = GrainerRegistry::new();
//! registry.register("silent", |_| Ok(Arc::new(Silent)));
//! ```

pub mod config;
pub mod error;
pub mod grain;
pub mod graigasm;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{GrainError, Result},
    grain::{Grainer, GrainerRegistry},
    graigasm::Graigasm,
};

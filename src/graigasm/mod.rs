//! # Graigasm
//!
//! Luma-adaptive multi-band grain. The pipeline for one frame:
//!
//! 1. Masks - one cumulative mask per band from the reference luma, reduced to
//!    exclusive masks by subtracting the previous band's mask
//! 2. Layers - per band, noise on a reduced neutral canvas, scaled back up
//!    and subtracted from the source
//! 3. Compositing - each layer cross-faded with the source by its mask, then
//!    folded onto the running output in band order
//!
//! Masks and layers are computed in parallel; the fold is sequential.

pub mod band;
pub mod compositor;
pub mod engine;
pub mod layer;
pub mod mask;

// Re-exports for convenience
pub use band::{Band, PerBand};
pub use compositor::LayerCompositor;
pub use engine::{Graigasm, GrainingOptions, GrainingOutput, MaskPreview};
pub use layer::{chroma_modulus, BandGrainSynthesizer};
pub use mask::{mask_value, BandMaskBuilder};

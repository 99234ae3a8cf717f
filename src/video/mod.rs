//! # Video Frame Module
//!
//! Planar frame representation, plane arithmetic, resampling and image interop.

pub mod ops;
pub mod resample;
pub mod types;

mod convert;

pub use ops::{make_diff, merge_diff};
pub use resample::{resize_plane, Kernel};
pub use types::{ColorFamily, Frame, Plane, PlaneBuffer, SampleType, VideoFormat};

//! Plane-wise arithmetic shared by the grain layers and the compositor.

use crate::error::{FormatError, Result};
use crate::video::types::{Frame, Plane, VideoFormat};

/// `a - b` stored around the format's diff offset
pub fn make_diff(a: &Frame, b: &Frame) -> Result<Frame> {
    let format = fixed_format(a)?;
    let offset = format.diff_offset();
    combine(a, b, |x, y| format.quantize(x - y + offset))
}

/// Re-apply a difference produced by [`make_diff`]
pub fn merge_diff(a: &Frame, diff: &Frame) -> Result<Frame> {
    let format = fixed_format(a)?;
    let offset = format.diff_offset();
    combine(a, diff, |x, d| format.quantize(x + d - offset))
}

/// Combine two frames of the same format plane by plane
pub fn combine<F>(a: &Frame, b: &Frame, f: F) -> Result<Frame>
where
    F: Fn(f32, f32) -> f32,
{
    let format = fixed_format(a)?;
    if a.num_planes() != b.num_planes() {
        return Err(FormatError::GeometryMismatch {
            expected: format!("{} planes", a.num_planes()),
            actual: format!("{} planes", b.num_planes()),
        }
        .into());
    }
    let planes = a
        .planes()
        .iter()
        .zip(b.planes())
        .map(|(pa, pb)| pa.zip_map(pb, &f))
        .collect::<Result<Vec<Plane>>>()?;
    Frame::from_planes(format, planes)
}

pub(crate) fn fixed_format(frame: &Frame) -> Result<VideoFormat> {
    frame.format().copied().ok_or_else(|| FormatError::VariableFormat.into())
}

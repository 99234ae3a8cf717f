use crate::error::{FormatError, Result};
use crate::video::ops::{fixed_format, make_diff, merge_diff};
use crate::video::types::{Frame, Plane};

/// Folds grained layers onto the source frame, one band at a time
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerCompositor;

impl LayerCompositor {
    pub fn new() -> Self {
        Self
    }

    /// Cross-fade between `base` and a grained layer, weighted by a band mask
    ///
    /// `masks` holds one plane per frame plane; a full-scale mask selects the
    /// grained layer, a zero mask keeps `base`.
    pub fn blend(&self, base: &Frame, grained: &Frame, masks: &[Plane]) -> Result<Frame> {
        let format = fixed_format(base)?;
        if masks.len() != base.num_planes() || grained.num_planes() != base.num_planes() {
            return Err(FormatError::GeometryMismatch {
                expected: format!("{} planes", base.num_planes()),
                actual: format!("{} grained planes, {} mask planes", grained.num_planes(), masks.len()),
            }
            .into());
        }
        let peak = format.peak();

        let planes = grained
            .planes()
            .iter()
            .zip(base.planes())
            .zip(masks)
            .map(|((g, b), m)| {
                g.zip3_map(b, m, |g, b, m| {
                    let w = m / peak;
                    format.quantize(g * w + b * (1.0 - w))
                })
            })
            .collect::<Result<Vec<Plane>>>()?;

        Frame::from_planes(format, planes)
    }

    /// Accumulate blended layers in order: `out = merge_diff(blended, make_diff(base, out))`
    ///
    /// Each step depends on the previous output, so this stays sequential.
    pub fn fold(&self, base: &Frame, blended: &[Frame]) -> Result<Frame> {
        let mut out = base.clone();
        for layer in blended {
            out = merge_diff(layer, &make_diff(base, &out)?)?;
        }
        Ok(out)
    }

    /// Blend every band and fold the results onto `base`
    pub fn composite(&self, base: &Frame, masks: &[Vec<Plane>], grained: &[Frame]) -> Result<Frame> {
        if masks.len() != grained.len() {
            return Err(FormatError::GeometryMismatch {
                expected: format!("{} band layers", masks.len()),
                actual: format!("{} band layers", grained.len()),
            }
            .into());
        }
        let blended = grained
            .iter()
            .zip(masks)
            .map(|(layer, mask)| self.blend(base, layer, mask))
            .collect::<Result<Vec<Frame>>>()?;
        self.fold(base, &blended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::types::VideoFormat;

    fn gray(value: f32) -> Frame {
        Frame::blank(VideoFormat::gray(8), 4, 4, &[value]).unwrap()
    }

    #[test]
    fn test_blend_endpoints() {
        let compositor = LayerCompositor::new();
        let base = gray(100.0);
        let grained = gray(80.0);

        let full = compositor.blend(&base, &grained, &[Plane::new_filled(4, 4, 255.0)]).unwrap();
        assert_eq!(full, grained);

        let none = compositor.blend(&base, &grained, &[Plane::new_filled(4, 4, 0.0)]).unwrap();
        assert_eq!(none, base);

        let half = compositor.blend(&base, &grained, &[Plane::new_filled(4, 4, 127.5)]).unwrap();
        assert_eq!(half.plane(0).unwrap().get(0, 0), 90.0);
    }

    #[test]
    fn test_fold_single_layer_is_that_layer() {
        let compositor = LayerCompositor::new();
        let base = gray(100.0);
        let layer = gray(90.0);
        let out = compositor.fold(&base, &[layer.clone()]).unwrap();
        assert_eq!(out, layer);
    }

    #[test]
    fn test_fold_accumulates_against_running_output() {
        let compositor = LayerCompositor::new();
        let base = gray(100.0);
        // out1 = 90; out2 = 95 + (100 - 90) = 105
        let out = compositor.fold(&base, &[gray(90.0), gray(95.0)]).unwrap();
        assert_eq!(out.plane(0).unwrap().get(2, 2), 105.0);
    }

    #[test]
    fn test_fold_is_order_dependent() {
        let compositor = LayerCompositor::new();
        let base = gray(100.0);
        let ab = compositor.fold(&base, &[gray(90.0), gray(95.0)]).unwrap();
        let ba = compositor.fold(&base, &[gray(95.0), gray(90.0)]).unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_untouched_layers_keep_base() {
        let compositor = LayerCompositor::new();
        let base = gray(100.0);
        let masks = vec![vec![Plane::new_filled(4, 4, 255.0)], vec![Plane::new_filled(4, 4, 0.0)]];
        let out = compositor.composite(&base, &masks, &[base.clone(), base.clone()]).unwrap();
        assert_eq!(out, base);
    }
}

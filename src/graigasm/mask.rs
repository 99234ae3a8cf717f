use rayon::prelude::*;

use crate::error::Result;
use crate::video::resample::{resize_plane, Kernel};
use crate::video::types::{Plane, VideoFormat};

/// Weight of one reference sample for a band
///
/// Samples below the transition zone get `peak`, samples above it get 0, and
/// the zone itself (both ends included) ramps linearly from `peak` down to 0.
/// A zero-width zone maps `x == threshold` to `peak`, the start of the ramp.
pub fn mask_value(x: f32, threshold: f32, overflow: f32, peak: f32) -> f32 {
    let min_thr = threshold - overflow * peak / 2.0;
    let max_thr = threshold + overflow * peak / 2.0;

    if min_thr <= x && x <= max_thr {
        if max_thr > min_thr {
            (((x - min_thr) / (max_thr - min_thr)) * peak - peak).abs()
        } else {
            peak
        }
    } else if x < min_thr {
        peak
    } else {
        0.0
    }
}

/// Builds per-band weight masks from a luma reference
#[derive(Debug, Clone, Copy)]
pub struct BandMaskBuilder {
    format: VideoFormat,
}

impl BandMaskBuilder {
    pub fn new(format: VideoFormat) -> Self {
        Self { format }
    }

    pub fn peak(&self) -> f32 {
        self.format.peak()
    }

    /// Cumulative mask of one band
    pub fn build(&self, reference: &Plane, threshold: f32, overflow: f32) -> Plane {
        let peak = self.peak();
        reference.map(|x| self.format.quantize(mask_value(x, threshold, overflow, peak)))
    }

    /// Cumulative masks of all bands, computed in parallel
    pub fn build_all(&self, reference: &Plane, bands: &[(f32, f32)]) -> Vec<Plane> {
        bands
            .par_iter()
            .map(|&(threshold, overflow)| self.build(reference, threshold, overflow))
            .collect()
    }

    /// Turn cumulative masks into each band's increment over the previous one
    ///
    /// A zero mask is put in front, then `exclusive[i] = cumulative[i] - cumulative[i - 1]`.
    /// Nothing is clamped: thresholds given out of order produce negative weights.
    pub fn exclusive(cumulative: &[Plane]) -> Result<Vec<Plane>> {
        let Some(first) = cumulative.first() else {
            return Ok(Vec::new());
        };
        let zero = Plane::new_filled(first.width(), first.height(), 0.0);

        std::iter::once(&zero)
            .chain(cumulative.iter())
            .zip(cumulative.iter())
            .map(|(previous, current)| current.zip_map(previous, |c, p| c - p))
            .collect()
    }

    /// One mask plane per frame plane
    ///
    /// Chroma masks are the luma mask resized bilinearly to the chroma plane
    /// size. Integer formats round half to even but do not clamp, so negative
    /// exclusive weights carry over to chroma.
    pub fn expand(&self, mask: &Plane) -> Vec<Plane> {
        let (width, height) = mask.dimensions();
        let is_float = self.format.is_float();
        (0..self.format.num_planes())
            .map(|i| {
                let (pw, ph) = self.format.plane_size(i, width, height);
                if (pw, ph) == (width, height) {
                    mask.clone()
                } else {
                    resize_plane(mask, pw, ph, Kernel::Bilinear, (0.0, 0.0))
                        .map(|v| if is_float { v } else { v.round_ties_even() })
                }
            })
            .collect()
    }
}

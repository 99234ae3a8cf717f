use tracing::debug;

use crate::error::{ConfigurationError, GrainerError, Result};
use crate::graigasm::band::Band;
use crate::video::ops::fixed_format;
use crate::video::resample::{resize_plane, Kernel};
use crate::video::types::{Frame, Plane, VideoFormat};

/// Alignment the grain layer dimensions must keep for a chroma layout
pub fn chroma_modulus(subsampling_w: u32, subsampling_h: u32) -> Result<u32> {
    match (subsampling_w, subsampling_h) {
        (0, 0) => Ok(1),
        (1, 0) | (0, 1) | (1, 1) => Ok(2),
        (2, 0) | (2, 2) => Ok(4),
        _ => Err(ConfigurationError::UnsupportedSubsampling {
            subsampling_w,
            subsampling_h,
        }
        .into()),
    }
}

fn floor_to_multiple(x: u32, modulus: u32) -> u32 {
    x - x % modulus
}

/// Builds the grained difference layer of one band
#[derive(Debug, Clone, Copy)]
pub struct BandGrainSynthesizer {
    format: VideoFormat,
    modulus: u32,
}

impl BandGrainSynthesizer {
    pub fn new(format: VideoFormat) -> Result<Self> {
        let modulus = chroma_modulus(format.subsampling_w, format.subsampling_h)?;
        Ok(Self { format, modulus })
    }

    pub fn modulus(&self) -> u32 {
        self.modulus
    }

    /// Dimensions of the reduced grain canvas for a `size` divisor
    pub fn layer_dimensions(&self, width: u32, height: u32, size: f32) -> Result<(u32, u32)> {
        let scaled = |v: u32| (v as f64 / size as f64).round_ties_even().max(0.0) as u32;
        let w = floor_to_multiple(scaled(width), self.modulus);
        let h = floor_to_multiple(scaled(height), self.modulus);
        if w == 0 || h == 0 {
            return Err(ConfigurationError::ZeroSizedLayer { width: w, height: h, size }.into());
        }
        Ok((w, h))
    }

    /// Noise a reduced neutral canvas, scale it back up and subtract it from `base`
    ///
    /// The result is `base - (upsampled - neutral)` per plane, quantized to
    /// the format: `base` itself wherever the grainer added nothing. Float
    /// layers are referenced to the blank canvas (0.5 luma, 0 chroma), not a
    /// plain `base - upsampled`.
    pub fn synthesize(&self, base: &Frame, band: &Band) -> Result<Frame> {
        let (width, height) = (base.width(), base.height());
        let (ss_w, ss_h) = self.layer_dimensions(width, height, band.size)?;
        let neutral = self.format.neutral();

        debug!(
            "grain layer {}x{} -> {}x{} (size {}, sharp {}, grainer {})",
            ss_w,
            ss_h,
            width,
            height,
            band.size,
            band.sharp,
            band.grainer.name()
        );

        let blank = Frame::blank(self.format, ss_w, ss_h, &neutral)?;
        let grained = band.grainer.grain(&blank, band.strength)?;
        if grained.width() != ss_w
            || grained.height() != ss_h
            || grained.num_planes() != blank.num_planes()
            || fixed_format(&grained)? != self.format
        {
            return Err(GrainerError::GeometryChanged {
                name: band.grainer.name().to_string(),
            }
            .into());
        }

        let kernel = Kernel::from_sharpness(band.sharp);
        let planes = grained
            .planes()
            .iter()
            .zip(base.planes())
            .enumerate()
            .map(|(i, (noise, source))| {
                let (pw, ph) = source.dimensions();
                let upsampled = resize_plane(noise, pw, ph, kernel, (0.0, 0.0)).map(|v| self.format.quantize(v));
                let offset = neutral[i];
                source.zip_map(&upsampled, |s, u| self.format.quantize(s - (u - offset)))
            })
            .collect::<Result<Vec<Plane>>>()?;

        Frame::from_planes(self.format, planes)
    }
}

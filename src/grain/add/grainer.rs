use crate::{
    error::{GrainerError, Result},
    grain::noise::{apply_noise, Distribution, Seed},
    grain::traits::{Grainer, GrainerConfig, GrainerMetadata, Strength},
    video::types::Frame,
};

use super::{CONSTANT, SEED};

/// Additive Gaussian grain
///
/// `strength` is read as a variance in 8-bit units: the luma value drives
/// plane 0 and the chroma value drives the remaining planes.
#[derive(Debug, Clone, PartialEq)]
pub struct AddGrain {
    seed: Seed,
}

impl AddGrain {
    /// `seed = -1` draws fresh noise on each call unless `constant` is set,
    /// in which case one seed is picked now and reused.
    pub fn new(seed: i64, constant: bool) -> Self {
        let seed = match Seed::from_param(seed) {
            Seed::Entropy if constant => Seed::Fixed(rand::random()),
            other => other,
        };
        Self { seed }
    }

    pub fn from_config(config: &GrainerConfig) -> Result<Self> {
        config.check_keys(&[SEED, CONSTANT])?;
        Ok(Self::new(
            config.get_i64_or(SEED, -1),
            config.get_bool_or(CONSTANT, false),
        ))
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }
}

impl Default for AddGrain {
    fn default() -> Self {
        Self::new(-1, false)
    }
}

impl Grainer for AddGrain {
    fn name(&self) -> &str {
        "add"
    }

    fn description(&self) -> &str {
        "Gaussian grain with luma/chroma variance in 8-bit units"
    }

    fn grain(&self, frame: &Frame, strength: Strength) -> Result<Frame> {
        if strength.luma < 0.0 || strength.chroma < 0.0 {
            return Err(GrainerError::InvalidParameter {
                name: self.name().to_string(),
                key: "strength".to_string(),
                value: format!("({}, {})", strength.luma, strength.chroma),
            }
            .into());
        }
        let peak = frame.format().map(|f| f.peak()).unwrap_or(255.0);
        let scale = peak / 255.0;
        apply_noise(frame, strength, Distribution::Gaussian, self.seed, |_, var| var.sqrt() * scale)
    }

    fn metadata(&self) -> GrainerMetadata {
        GrainerMetadata {
            performance_impact: 0.2,
            deterministic: matches!(self.seed, Seed::Fixed(_)),
            optional_parameters: vec![
                (SEED.to_string(), "Noise seed, -1 for random (default -1)".to_string()),
                (CONSTANT.to_string(), "Reuse one seed for every call (default false)".to_string()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::types::VideoFormat;

    #[test]
    fn test_zero_variance_is_noop() {
        let frame = Frame::blank(VideoFormat::yuv(8, 1, 1), 32, 32, &[100.0, 128.0, 128.0]).unwrap();
        let out = AddGrain::default().grain(&frame, Strength::new(0.0, 0.0)).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn test_variance_roughly_matches() {
        let frame = Frame::blank(VideoFormat::gray_float(), 128, 128, &[0.5]).unwrap();
        let out = AddGrain::new(11, false).grain(&frame, Strength::new(16.0, 0.0)).unwrap();
        let samples = out.plane(0).unwrap().samples();
        let n = samples.len() as f32;
        let mean = samples.iter().sum::<f32>() / n;
        let std = (samples.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n).sqrt();
        // sqrt(16) = 4 eight-bit steps
        assert!((std * 255.0 - 4.0).abs() < 0.3);
    }

    #[test]
    fn test_constant_pins_a_seed() {
        let grainer = AddGrain::new(-1, true);
        assert!(matches!(grainer.seed(), Seed::Fixed(_)));

        let frame = Frame::blank(VideoFormat::gray(8), 16, 16, &[128.0]).unwrap();
        let a = grainer.grain(&frame, Strength::new(9.0, 0.0)).unwrap();
        let b = grainer.grain(&frame, Strength::new(9.0, 0.0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_config_rejects_unknown_parameter() {
        let config = GrainerConfig::named("add").set("hcorr", 0.5);
        assert!(AddGrain::from_config(&config).is_err());
    }
}

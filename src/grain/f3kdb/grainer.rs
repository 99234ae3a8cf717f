use crate::{
    error::{GrainerError, Result},
    grain::noise::{apply_noise, Distribution, Seed},
    grain::traits::{Grainer, GrainerConfig, GrainerMetadata, Strength},
    video::types::Frame,
};

use super::{DYNAMIC_GRAIN, RANDOM_ALGO_GRAIN, SEED};

/// Noise shape used for the grain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomAlgorithm {
    Uniform,
    Gaussian,
}

impl RandomAlgorithm {
    fn from_param(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Uniform),
            2 => Some(Self::Gaussian),
            _ => None,
        }
    }

    fn distribution(&self) -> Distribution {
        match self {
            Self::Uniform => Distribution::Uniform,
            Self::Gaussian => Distribution::Gaussian,
        }
    }
}

/// Grain from an f3kdb deband pass run at the lowest threshold
///
/// Strengths are truncated to integers; one unit is a quarter of an 8-bit step.
#[derive(Debug, Clone, PartialEq)]
pub struct F3kdbGrain {
    seed: Seed,
    algorithm: RandomAlgorithm,
}

impl F3kdbGrain {
    /// Without `dynamic_grain` the same pattern is reused on every call.
    pub fn new(seed: i64, dynamic_grain: bool, algorithm: RandomAlgorithm) -> Self {
        let seed = match Seed::from_param(seed) {
            Seed::Entropy if !dynamic_grain => Seed::Fixed(rand::random()),
            other => other,
        };
        Self { seed, algorithm }
    }

    pub fn from_config(config: &GrainerConfig) -> Result<Self> {
        config.check_keys(&[SEED, DYNAMIC_GRAIN, RANDOM_ALGO_GRAIN])?;
        let algo = config.get_i64_or(RANDOM_ALGO_GRAIN, 1);
        let algorithm = RandomAlgorithm::from_param(algo).ok_or_else(|| GrainerError::InvalidParameter {
            name: config.name.clone(),
            key: RANDOM_ALGO_GRAIN.to_string(),
            value: algo.to_string(),
        })?;
        Ok(Self::new(
            config.get_i64_or(SEED, -1),
            config.get_bool_or(DYNAMIC_GRAIN, false),
            algorithm,
        ))
    }
}

impl Default for F3kdbGrain {
    fn default() -> Self {
        Self::new(-1, false, RandomAlgorithm::Uniform)
    }
}

impl Grainer for F3kdbGrain {
    fn name(&self) -> &str {
        "f3kdb"
    }

    fn description(&self) -> &str {
        "Integer-strength deband grain, uniform or gaussian"
    }

    fn grain(&self, frame: &Frame, strength: Strength) -> Result<Frame> {
        let peak = frame.format().map(|f| f.peak()).unwrap_or(255.0);
        let scale = peak / 255.0;
        apply_noise(frame, strength, self.algorithm.distribution(), self.seed, |_, grain| {
            (grain.trunc().max(0.0) / 4.0) * scale
        })
    }

    fn metadata(&self) -> GrainerMetadata {
        GrainerMetadata {
            performance_impact: 0.2,
            deterministic: matches!(self.seed, Seed::Fixed(_)),
            optional_parameters: vec![
                (SEED.to_string(), "Noise seed, -1 for random".to_string()),
                (DYNAMIC_GRAIN.to_string(), "New pattern on every call (default false)".to_string()),
                (RANDOM_ALGO_GRAIN.to_string(), "1 = uniform, 2 = gaussian (default 1)".to_string()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::types::VideoFormat;

    #[test]
    fn test_fractional_strength_truncates_to_noop() {
        let frame = Frame::blank(VideoFormat::gray(8), 16, 16, &[128.0]).unwrap();
        let out = F3kdbGrain::default().grain(&frame, Strength::new(0.9, 0.0)).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn test_uniform_grain_bounded() {
        let frame = Frame::blank(VideoFormat::gray(8), 32, 32, &[128.0]).unwrap();
        let out = F3kdbGrain::new(1, false, RandomAlgorithm::Uniform)
            .grain(&frame, Strength::new(64.0, 0.0))
            .unwrap();
        assert!(out.plane(0).unwrap().samples().iter().all(|v| (v - 128.0).abs() <= 16.0));
    }

    #[test]
    fn test_static_grain_repeats() {
        let grainer = F3kdbGrain::default();
        let frame = Frame::blank(VideoFormat::gray(8), 16, 16, &[128.0]).unwrap();
        let a = grainer.grain(&frame, Strength::new(32.0, 0.0)).unwrap();
        let b = grainer.grain(&frame, Strength::new(32.0, 0.0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_random_algorithm() {
        let config = GrainerConfig::named("f3kdb").set(RANDOM_ALGO_GRAIN, 7);
        assert!(F3kdbGrain::from_config(&config).is_err());
    }
}

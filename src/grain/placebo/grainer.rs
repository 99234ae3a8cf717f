use crate::{
    error::Result,
    grain::noise::{apply_noise, Distribution, Seed},
    grain::traits::{Grainer, GrainerConfig, GrainerMetadata, Strength},
    video::types::Frame,
};

use super::SEED;

/// Grain from a deband pass run with a zero threshold
///
/// Only the dithering grain survives: uniform noise spread over `[-0.5, 0.5)`
/// scaled by `grain / 1000` of the peak value.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceboGrain {
    seed: Seed,
}

impl PlaceboGrain {
    pub fn new(seed: i64) -> Self {
        Self {
            seed: Seed::from_param(seed),
        }
    }

    pub fn from_config(config: &GrainerConfig) -> Result<Self> {
        config.check_keys(&[SEED])?;
        Ok(Self::new(config.get_i64_or(SEED, -1)))
    }
}

impl Default for PlaceboGrain {
    fn default() -> Self {
        Self::new(-1)
    }
}

impl Grainer for PlaceboGrain {
    fn name(&self) -> &str {
        "placebo"
    }

    fn description(&self) -> &str {
        "Uniform deband-style dithering grain"
    }

    fn grain(&self, frame: &Frame, strength: Strength) -> Result<Frame> {
        let peak = frame.format().map(|f| f.peak()).unwrap_or(1.0);
        // Uniform draws cover [-1, 1); halve to match the [-0.5, 0.5) spread
        apply_noise(frame, strength, Distribution::Uniform, self.seed, |_, grain| {
            grain.max(0.0) / 1000.0 * peak * 0.5
        })
    }

    fn metadata(&self) -> GrainerMetadata {
        GrainerMetadata {
            performance_impact: 0.2,
            deterministic: matches!(self.seed, Seed::Fixed(_)),
            optional_parameters: vec![(SEED.to_string(), "Noise seed, -1 for random".to_string())],
        }
    }
}

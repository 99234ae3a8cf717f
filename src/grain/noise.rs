//! Random sample sources shared by the built-in grainers.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::error::Result;
use crate::grain::traits::Strength;
use crate::video::types::{Frame, Plane};

/// Shape of the per-sample noise
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distribution {
    /// Standard normal, scaled by the amplitude
    Gaussian,
    /// Uniform in `[-amplitude, amplitude)`
    Uniform,
}

/// How a grainer seeds its generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    /// Fresh entropy on every call
    Entropy,
    /// The same sequence on every call
    Fixed(u64),
}

impl Seed {
    /// Interpret the conventional `-1 = random` integer seed parameter
    pub fn from_param(seed: i64) -> Self {
        if seed < 0 {
            Seed::Entropy
        } else {
            Seed::Fixed(seed as u64)
        }
    }

    pub fn rng(&self) -> SmallRng {
        match self {
            Seed::Entropy => SmallRng::from_entropy(),
            Seed::Fixed(seed) => SmallRng::seed_from_u64(*seed),
        }
    }
}

fn sample<R: Rng>(rng: &mut R, distribution: Distribution) -> f32 {
    match distribution {
        Distribution::Gaussian => rng.sample::<f32, _>(StandardNormal),
        Distribution::Uniform => rng.gen_range(-1.0f32..1.0),
    }
}

fn noise_plane<R: Rng>(plane: &Plane, amplitude: f32, distribution: Distribution, rng: &mut R) -> Plane {
    let mut out = plane.clone();
    for v in out.samples_mut() {
        *v += sample(rng, distribution) * amplitude;
    }
    out
}

/// Add noise to every plane with a nonzero amplitude, then quantize
///
/// `amplitude` maps a plane index and its strength to the absolute noise
/// amplitude in sample units. Planes whose amplitude is zero are copied as is.
pub fn apply_noise<F>(
    frame: &Frame,
    strength: Strength,
    distribution: Distribution,
    seed: Seed,
    amplitude: F,
) -> Result<Frame>
where
    F: Fn(usize, f32) -> f32,
{
    let format = crate::video::ops::fixed_format(frame)?;
    let mut rng = seed.rng();

    let planes = frame
        .planes()
        .iter()
        .enumerate()
        .map(|(i, plane)| {
            let amp = amplitude(i, strength.for_plane(i));
            if amp == 0.0 {
                plane.clone()
            } else {
                noise_plane(plane, amp, distribution, &mut rng).map(|v| format.quantize(v))
            }
        })
        .collect();

    Frame::from_planes(format, planes)
}

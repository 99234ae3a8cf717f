//! # Resampling
//!
//! Separable, center-aligned resizing of single planes with a bilinear or a
//! Mitchell-Netravali bicubic kernel. Down-scaling widens the kernel by the
//! scaling ratio so every source sample contributes.

use crate::video::types::Plane;

/// Interpolation kernel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kernel {
    Bilinear,
    /// Cubic kernel with the usual `b`/`c` parameters (0, 0.5 = Catmull-Rom)
    Bicubic { b: f64, c: f64 },
}

impl Kernel {
    /// Cubic kernel from a sharpness value where 50 is Catmull-Rom
    pub fn from_sharpness(sharp: f32) -> Self {
        let b = 1.0 - sharp as f64 / 50.0;
        let c = (1.0 - b) / 2.0;
        Kernel::Bicubic { b, c }
    }

    fn support(&self) -> f64 {
        match self {
            Kernel::Bilinear => 1.0,
            Kernel::Bicubic { .. } => 2.0,
        }
    }

    fn weight(&self, x: f64) -> f64 {
        let x = x.abs();
        match *self {
            Kernel::Bilinear => (1.0 - x).max(0.0),
            Kernel::Bicubic { b, c } => {
                if x < 1.0 {
                    ((12.0 - 9.0 * b - 6.0 * c) * x * x * x
                        + (-18.0 + 12.0 * b + 6.0 * c) * x * x
                        + (6.0 - 2.0 * b))
                        / 6.0
                } else if x < 2.0 {
                    ((-b - 6.0 * c) * x * x * x
                        + (6.0 * b + 30.0 * c) * x * x
                        + (-12.0 * b - 48.0 * c) * x
                        + (8.0 * b + 24.0 * c))
                        / 6.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Contributions of source samples to one destination sample
struct Tap {
    start: usize,
    weights: Vec<f64>,
}

fn compute_taps(src_len: u32, dst_len: u32, kernel: Kernel, shift: f64) -> Vec<Tap> {
    let ratio = dst_len as f64 / src_len as f64;
    let scale = if ratio < 1.0 { 1.0 / ratio } else { 1.0 };
    let support = kernel.support() * scale;
    let last = src_len as i64 - 1;

    (0..dst_len)
        .map(|i| {
            let center = (i as f64 + 0.5) / ratio - 0.5 + shift;
            let left = (center - support).floor() as i64 + 1;
            let right = (center + support).ceil() as i64 - 1;

            // Out-of-range taps fold onto the edge samples
            let start = left.clamp(0, last);
            let end = right.clamp(0, last);
            let mut weights = vec![0.0; (end - start + 1) as usize];
            let mut total = 0.0;
            for j in left..=right {
                let w = kernel.weight((j as f64 - center) / scale);
                let idx = (j.clamp(0, last) - start) as usize;
                weights[idx] += w;
                total += w;
            }
            if total != 0.0 {
                for w in weights.iter_mut() {
                    *w /= total;
                }
            }
            Tap {
                start: start as usize,
                weights,
            }
        })
        .collect()
}

/// Resize a plane to `width`x`height`, shifting the source grid by `shift` samples
///
/// Values are not clamped or rounded; callers quantize to their format.
pub fn resize_plane(plane: &Plane, width: u32, height: u32, kernel: Kernel, shift: (f64, f64)) -> Plane {
    let (src_w, src_h) = plane.dimensions();
    if (src_w, src_h) == (width, height) && shift == (0.0, 0.0) {
        return plane.clone();
    }

    let src = plane.samples();
    let taps_x = compute_taps(src_w, width, kernel, shift.0);
    let taps_y = compute_taps(src_h, height, kernel, shift.1);

    // Horizontal pass: src_h rows of `width` samples
    let mut tmp = vec![0.0f64; width as usize * src_h as usize];
    for y in 0..src_h as usize {
        let row = &src[y * src_w as usize..(y + 1) * src_w as usize];
        for (x, tap) in taps_x.iter().enumerate() {
            let acc: f64 = tap
                .weights
                .iter()
                .enumerate()
                .map(|(k, w)| row[tap.start + k] as f64 * w)
                .sum();
            tmp[y * width as usize + x] = acc;
        }
    }

    // Vertical pass
    let mut out = vec![0.0f32; width as usize * height as usize];
    for (y, tap) in taps_y.iter().enumerate() {
        for x in 0..width as usize {
            let acc: f64 = tap
                .weights
                .iter()
                .enumerate()
                .map(|(k, w)| tmp[(tap.start + k) * width as usize + x] * w)
                .sum();
            out[y * width as usize + x] = acc as f32;
        }
    }

    Plane::from_samples(width, height, out).unwrap_or_else(|| Plane::new_filled(width, height, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catmull_rom_from_neutral_sharpness() {
        assert_eq!(Kernel::from_sharpness(50.0), Kernel::Bicubic { b: 0.0, c: 0.5 });
        assert_eq!(Kernel::from_sharpness(0.0), Kernel::Bicubic { b: 1.0, c: 0.0 });
    }

    #[test]
    fn test_kernel_interpolates_at_integer_offsets() {
        let k = Kernel::Bicubic { b: 0.0, c: 0.5 };
        assert!((k.weight(0.0) - 1.0).abs() < 1e-12);
        assert!(k.weight(1.0).abs() < 1e-12);
        assert!(k.weight(2.0).abs() < 1e-12);
    }

    #[test]
    fn test_flat_plane_stays_flat() {
        let plane = Plane::new_filled(17, 9, 128.0);
        let up = resize_plane(&plane, 40, 23, Kernel::from_sharpness(80.0), (0.0, 0.0));
        assert_eq!(up.dimensions(), (40, 23));
        assert!(up.samples().iter().all(|v| (v - 128.0).abs() < 1e-3));

        let down = resize_plane(&plane, 5, 3, Kernel::Bilinear, (0.0, 0.0));
        assert!(down.samples().iter().all(|v| (v - 128.0).abs() < 1e-3));
    }

    #[test]
    fn test_bilinear_halving_averages_pairs() {
        let plane = Plane::from_fn(4, 1, |x, _| if x < 2 { 0.0 } else { 100.0 });
        let half = resize_plane(&plane, 2, 1, Kernel::Bilinear, (0.0, 0.0));
        // Left output straddles samples 0..2, right output samples 2..4
        assert!(half.get(0, 0) < 50.0);
        assert!(half.get(1, 0) > 50.0);
    }

    #[test]
    fn test_same_size_is_identity() {
        let plane = Plane::from_fn(6, 4, |x, y| (x * 7 + y) as f32);
        let same = resize_plane(&plane, 6, 4, Kernel::Bilinear, (0.0, 0.0));
        assert_eq!(same, plane);
    }
}

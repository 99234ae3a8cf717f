use image::{ImageBuffer, Luma};
use serde::{Deserialize, Serialize};

use crate::error::{FormatError, Result};

/// Storage for a single plane: one `f32` sample per pixel
pub type PlaneBuffer = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Color family of a frame format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorFamily {
    Gray,
    Yuv,
    Rgb,
}

/// Numeric representation of the samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleType {
    Integer,
    Float,
}

/// Fixed format of a frame: family, sample representation and chroma layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFormat {
    pub color_family: ColorFamily,
    pub sample_type: SampleType,
    pub bits_per_sample: u32,
    /// log2 of the horizontal chroma subsampling factor
    pub subsampling_w: u32,
    /// log2 of the vertical chroma subsampling factor
    pub subsampling_h: u32,
}

impl VideoFormat {
    pub fn gray(bits: u32) -> Self {
        Self {
            color_family: ColorFamily::Gray,
            sample_type: SampleType::Integer,
            bits_per_sample: bits,
            subsampling_w: 0,
            subsampling_h: 0,
        }
    }

    pub fn gray_float() -> Self {
        Self {
            color_family: ColorFamily::Gray,
            sample_type: SampleType::Float,
            bits_per_sample: 32,
            subsampling_w: 0,
            subsampling_h: 0,
        }
    }

    pub fn yuv(bits: u32, subsampling_w: u32, subsampling_h: u32) -> Self {
        Self {
            color_family: ColorFamily::Yuv,
            sample_type: SampleType::Integer,
            bits_per_sample: bits,
            subsampling_w,
            subsampling_h,
        }
    }

    pub fn yuv_float(subsampling_w: u32, subsampling_h: u32) -> Self {
        Self {
            color_family: ColorFamily::Yuv,
            sample_type: SampleType::Float,
            bits_per_sample: 32,
            subsampling_w,
            subsampling_h,
        }
    }

    pub fn rgb(bits: u32) -> Self {
        Self {
            color_family: ColorFamily::Rgb,
            sample_type: SampleType::Integer,
            bits_per_sample: bits,
            subsampling_w: 0,
            subsampling_h: 0,
        }
    }

    pub fn num_planes(&self) -> usize {
        match self.color_family {
            ColorFamily::Gray => 1,
            ColorFamily::Yuv | ColorFamily::Rgb => 3,
        }
    }

    pub fn is_float(&self) -> bool {
        self.sample_type == SampleType::Float
    }

    /// Maximum representable sample value
    pub fn peak(&self) -> f32 {
        if self.is_float() {
            1.0
        } else {
            ((1u64 << self.bits_per_sample) - 1) as f32
        }
    }

    /// Per-plane value of a flat mid-gray frame
    pub fn neutral(&self) -> Vec<f32> {
        let planes = self.num_planes();
        if self.is_float() {
            let mut neutral = vec![0.0; planes];
            neutral[0] = 0.5;
            neutral
        } else {
            vec![(1u64 << (self.bits_per_sample - 1)) as f32; planes]
        }
    }

    /// Offset a difference plane is stored around
    pub fn diff_offset(&self) -> f32 {
        if self.is_float() {
            0.0
        } else {
            (1u64 << (self.bits_per_sample - 1)) as f32
        }
    }

    /// Round and clamp a computed value to what this format can store
    pub fn quantize(&self, value: f32) -> f32 {
        if self.is_float() {
            value
        } else {
            value.round_ties_even().clamp(0.0, self.peak())
        }
    }

    /// Dimensions of `plane` for a frame whose luma is `width`x`height`
    pub fn plane_size(&self, plane: usize, width: u32, height: u32) -> (u32, u32) {
        if plane == 0 {
            (width, height)
        } else {
            (width >> self.subsampling_w, height >> self.subsampling_h)
        }
    }

    pub(crate) fn check_bit_depth(&self) -> Result<()> {
        let valid = match self.sample_type {
            SampleType::Float => self.bits_per_sample == 32,
            SampleType::Integer => (1..=16).contains(&self.bits_per_sample),
        };
        if valid {
            Ok(())
        } else {
            Err(FormatError::UnsupportedBitDepth { bits: self.bits_per_sample }.into())
        }
    }
}

/// One channel of a frame
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    buffer: PlaneBuffer,
}

impl Plane {
    /// Create a plane with every sample set to `value`
    pub fn new_filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            buffer: ImageBuffer::from_pixel(width, height, Luma([value])),
        }
    }

    /// Create a plane from row-major samples
    pub fn from_samples(width: u32, height: u32, samples: Vec<f32>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, samples).map(|buffer| Self { buffer })
    }

    /// Create a plane by evaluating `f` at each coordinate
    pub fn from_fn<F: FnMut(u32, u32) -> f32>(width: u32, height: u32, mut f: F) -> Self {
        Self {
            buffer: ImageBuffer::from_fn(width, height, |x, y| Luma([f(x, y)])),
        }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.buffer.get_pixel(x, y)[0]
    }

    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        self.buffer.put_pixel(x, y, Luma([value]));
    }

    pub fn samples(&self) -> &[f32] {
        self.buffer.as_raw()
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.buffer
    }

    /// Apply `f` to every sample, producing a new plane
    pub fn map<F: Fn(f32) -> f32>(&self, f: F) -> Self {
        let samples = self.samples().iter().map(|&v| f(v)).collect();
        Self::from_samples(self.width(), self.height(), samples)
            .unwrap_or_else(|| Self::new_filled(self.width(), self.height(), 0.0))
    }

    /// Combine two planes of the same geometry sample by sample
    pub fn zip_map<F: Fn(f32, f32) -> f32>(&self, other: &Plane, f: F) -> Result<Self> {
        ensure_same_geometry(self, other)?;
        let samples = self
            .samples()
            .iter()
            .zip(other.samples())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Self::from_samples(self.width(), self.height(), samples)
            .unwrap_or_else(|| Self::new_filled(self.width(), self.height(), 0.0)))
    }

    /// Combine three planes of the same geometry sample by sample
    pub fn zip3_map<F: Fn(f32, f32, f32) -> f32>(&self, b: &Plane, c: &Plane, f: F) -> Result<Self> {
        ensure_same_geometry(self, b)?;
        ensure_same_geometry(self, c)?;
        let samples = self
            .samples()
            .iter()
            .zip(b.samples())
            .zip(c.samples())
            .map(|((&x, &y), &z)| f(x, y, z))
            .collect();
        Ok(Self::from_samples(self.width(), self.height(), samples)
            .unwrap_or_else(|| Self::new_filled(self.width(), self.height(), 0.0)))
    }
}

fn ensure_same_geometry(a: &Plane, b: &Plane) -> Result<()> {
    if a.dimensions() != b.dimensions() {
        return Err(FormatError::GeometryMismatch {
            expected: format!("{}x{}", a.width(), a.height()),
            actual: format!("{}x{}", b.width(), b.height()),
        }
        .into());
    }
    Ok(())
}

/// A decoded video frame held as separate planes
///
/// The format is optional so that frames of a variable or unknown format can
/// be represented; processing rejects them up front.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    format: Option<VideoFormat>,
    planes: Vec<Plane>,
}

impl Frame {
    /// Create a frame from planes, checking them against the format's layout
    pub fn from_planes(format: VideoFormat, planes: Vec<Plane>) -> Result<Self> {
        format.check_bit_depth()?;
        let first = planes.first().ok_or_else(|| FormatError::GeometryMismatch {
            expected: format!("{} planes", format.num_planes()),
            actual: "0 planes".to_string(),
        })?;
        let (width, height) = first.dimensions();
        check_subsampling(&format, width, height)?;

        if planes.len() != format.num_planes() {
            return Err(FormatError::GeometryMismatch {
                expected: format!("{} planes", format.num_planes()),
                actual: format!("{} planes", planes.len()),
            }
            .into());
        }
        for (i, plane) in planes.iter().enumerate() {
            let (pw, ph) = format.plane_size(i, width, height);
            if plane.dimensions() != (pw, ph) {
                return Err(FormatError::GeometryMismatch {
                    expected: format!("plane {} at {}x{}", i, pw, ph),
                    actual: format!("{}x{}", plane.width(), plane.height()),
                }
                .into());
            }
        }

        Ok(Self {
            format: Some(format),
            planes,
        })
    }

    /// Wrap planes whose format is unknown
    pub fn with_unknown_format(planes: Vec<Plane>) -> Self {
        Self {
            format: None,
            planes,
        }
    }

    /// Create a flat frame; `color` holds one value per plane
    pub fn blank(format: VideoFormat, width: u32, height: u32, color: &[f32]) -> Result<Self> {
        format.check_bit_depth()?;
        check_subsampling(&format, width, height)?;
        let planes = (0..format.num_planes())
            .map(|i| {
                let (pw, ph) = format.plane_size(i, width, height);
                let value = color.get(i).or(color.last()).copied().unwrap_or(0.0);
                Plane::new_filled(pw, ph, value)
            })
            .collect();
        Ok(Self {
            format: Some(format),
            planes,
        })
    }

    pub fn format(&self) -> Option<&VideoFormat> {
        self.format.as_ref()
    }

    /// Luma width
    pub fn width(&self) -> u32 {
        self.planes.first().map(Plane::width).unwrap_or(0)
    }

    /// Luma height
    pub fn height(&self) -> u32 {
        self.planes.first().map(Plane::height).unwrap_or(0)
    }

    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }

    pub fn plane(&self, index: usize) -> Option<&Plane> {
        self.planes.get(index)
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }
}

fn check_subsampling(format: &VideoFormat, width: u32, height: u32) -> Result<()> {
    let mask_w = (1u32 << format.subsampling_w) - 1;
    let mask_h = (1u32 << format.subsampling_h) - 1;
    if width == 0 || height == 0 || width & mask_w != 0 || height & mask_h != 0 {
        return Err(FormatError::IncompatibleDimensions {
            width,
            height,
            subsampling_w: format.subsampling_w,
            subsampling_h: format.subsampling_h,
        }
        .into());
    }
    Ok(())
}

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::{
    error::{ConfigurationError, FormatError, Result},
    grain::{AddGrain, Grainer, Strength},
    graigasm::band::{check_band, default_overflow, Band, PerBand},
    graigasm::compositor::LayerCompositor,
    graigasm::layer::{chroma_modulus, BandGrainSynthesizer},
    graigasm::mask::BandMaskBuilder,
    video::types::{ColorFamily, Frame, Plane, VideoFormat},
};

/// Options of a single [`Graigasm::graining`] call
#[derive(Debug, Clone, Copy, Default)]
pub struct GrainingOptions<'a> {
    /// Frame whose luma drives the masks instead of the source luma
    pub prefilter: Option<&'a Frame>,

    /// Return the band masks instead of the grained frame
    pub show_masks: bool,
}

/// A band mask prepared for inspection
#[derive(Debug, Clone, PartialEq)]
pub struct MaskPreview {
    /// Position in the interleaved preview sequence
    pub index: usize,
    pub band: usize,
    pub threshold: f32,
    pub label: String,
    /// Mask planes in the source frame's format
    pub mask: Frame,
}

/// Result of [`Graigasm::graining`]
#[derive(Debug, Clone, PartialEq)]
pub enum GrainingOutput {
    Frame(Frame),
    Masks(Vec<MaskPreview>),
}

/// Luma-adaptive multi-band grain
///
/// Splits the luma range into bands at the given thresholds, synthesizes an
/// independent grain layer for each band and composites the layers back so
/// every band's grain only shows where the reference luma falls in it. Band
/// order matters: later bands are folded in last.
///
/// ```rust,no_run
/// use luma_grain::graigasm::{Graigasm, PerBand};
/// use luma_grain::video::{Frame, VideoFormat};
///
/// # fn main() -> luma_grain::Result<()> {
/// let graigasm = Graigasm::new(
///     vec![32.0, 80.0, 128.0, 176.0],
///     vec![(0.25, 0.0).into(), (0.2, 0.0).into(), (0.15, 0.0).into(), (0.0, 0.0).into()],
///     vec![1.25, 1.2, 1.15, 1.0],
///     vec![80.0, 70.0, 60.0, 50.0],
///     PerBand::Unset,
///     PerBand::Unset,
/// )?;
/// let frame = Frame::blank(VideoFormat::yuv(8, 1, 1), 1920, 1080, &[100.0, 128.0, 128.0])?;
/// let grained = graigasm.apply(&frame)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Graigasm {
    bands: Vec<Band>,
}

impl Graigasm {
    /// Validate and broadcast the per-band parameters
    ///
    /// `thresholds`, `strengths`, `sizes` and `sharps` must all have the same
    /// length. `overflows` defaults to `1 / bands` for every band and
    /// `grainers` to a random-seed [`AddGrain`].
    pub fn new(
        thresholds: Vec<f32>,
        strengths: Vec<Strength>,
        sizes: Vec<f32>,
        sharps: Vec<f32>,
        overflows: PerBand<f32>,
        grainers: PerBand<Arc<dyn Grainer>>,
    ) -> Result<Self> {
        let length = thresholds.len();
        if strengths.len() != length || sizes.len() != length || sharps.len() != length {
            return Err(ConfigurationError::LengthMismatch {
                thresholds: length,
                strengths: strengths.len(),
                sizes: sizes.len(),
                sharps: sharps.len(),
            }
            .into());
        }
        if length == 0 {
            return Err(ConfigurationError::NoBands.into());
        }

        let overflows = overflows.fill(length, "overflows", || default_overflow(length))?;
        let grainers = grainers.fill(length, "grainers", || {
            Arc::new(AddGrain::default()) as Arc<dyn Grainer>
        })?;

        let bands = thresholds
            .into_iter()
            .zip(strengths)
            .zip(sizes)
            .zip(sharps)
            .zip(overflows)
            .zip(grainers)
            .enumerate()
            .map(|(i, (((((threshold, strength), size), sharp), overflow), grainer))| {
                check_band(i, size, overflow)?;
                Ok(Band {
                    threshold,
                    strength,
                    size,
                    sharp,
                    overflow,
                    grainer,
                })
            })
            .collect::<Result<Vec<Band>>>()?;

        Ok(Self { bands })
    }

    /// Build directly from prepared bands
    pub fn from_bands(bands: Vec<Band>) -> Result<Self> {
        if bands.is_empty() {
            return Err(ConfigurationError::NoBands.into());
        }
        for (i, band) in bands.iter().enumerate() {
            check_band(i, band.size, band.overflow)?;
        }
        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Grain `frame` with the masks taken from its own luma
    pub fn apply(&self, frame: &Frame) -> Result<Frame> {
        let format = check_format(frame)?;
        let synthesizer = BandGrainSynthesizer::new(format)?;
        let masks = self.band_masks(frame, format, None)?;
        self.composite(frame, &synthesizer, &masks)
    }

    /// Band masks of `frame`, without any grain synthesis
    pub fn show_masks(&self, frame: &Frame, prefilter: Option<&Frame>) -> Result<Vec<MaskPreview>> {
        let format = check_format(frame)?;
        let masks = self.band_masks(frame, format, prefilter)?;
        self.previews(format, masks, 0)
    }

    /// Interleave the mask previews of a frame sequence, bands of a frame in a row
    pub fn show_masks_clip(&self, frames: &[Frame]) -> Result<Vec<MaskPreview>> {
        let mut previews = Vec::with_capacity(frames.len() * self.bands.len());
        for frame in frames {
            let format = check_format(frame)?;
            let masks = self.band_masks(frame, format, None)?;
            previews.extend(self.previews(format, masks, previews.len())?);
        }
        Ok(previews)
    }

    /// Grain a frame, or return its masks when `show_masks` is set
    pub fn graining(&self, frame: &Frame, options: GrainingOptions<'_>) -> Result<GrainingOutput> {
        let format = check_format(frame)?;
        let synthesizer = BandGrainSynthesizer::new(format)?;
        let masks = self.band_masks(frame, format, options.prefilter)?;

        if options.show_masks {
            return Ok(GrainingOutput::Masks(self.previews(format, masks, 0)?));
        }

        self.composite(frame, &synthesizer, &masks).map(GrainingOutput::Frame)
    }

    fn composite(&self, frame: &Frame, synthesizer: &BandGrainSynthesizer, masks: &[Vec<Plane>]) -> Result<Frame> {
        debug!(
            "graining {}x{} frame with {} bands",
            frame.width(),
            frame.height(),
            self.bands.len()
        );

        let grained = self
            .bands
            .par_iter()
            .map(|band| synthesizer.synthesize(frame, band))
            .collect::<Result<Vec<Frame>>>()?;

        LayerCompositor::new().composite(frame, masks, &grained)
    }

    /// Exclusive masks of every band, one plane per frame plane
    fn band_masks(&self, frame: &Frame, format: VideoFormat, prefilter: Option<&Frame>) -> Result<Vec<Vec<Plane>>> {
        let reference = reference_plane(frame, prefilter)?;
        let builder = BandMaskBuilder::new(format);

        let params: Vec<(f32, f32)> = self.bands.iter().map(|b| (b.threshold, b.overflow)).collect();
        let cumulative = builder.build_all(reference, &params);
        let exclusive = BandMaskBuilder::exclusive(&cumulative)?;

        for (band, mask) in self.bands.iter().zip(&exclusive) {
            debug!(
                "band threshold {} overflow {}: {} pixels weighted",
                band.threshold,
                band.overflow,
                mask.samples().iter().filter(|&&v| v != 0.0).count()
            );
        }

        Ok(exclusive.par_iter().map(|mask| builder.expand(mask)).collect())
    }

    fn previews(&self, format: VideoFormat, masks: Vec<Vec<Plane>>, first_index: usize) -> Result<Vec<MaskPreview>> {
        self.bands
            .iter()
            .zip(masks)
            .enumerate()
            .map(|(i, (band, planes))| -> Result<MaskPreview> {
                Ok(MaskPreview {
                    index: first_index + i,
                    band: i,
                    threshold: band.threshold,
                    label: format!("Threshold: {}", band.threshold),
                    mask: Frame::from_planes(format, planes)?,
                })
            })
            .collect()
    }
}

/// Reject frames the band pipeline cannot process
fn check_format(frame: &Frame) -> Result<VideoFormat> {
    let format = frame.format().copied().ok_or(FormatError::VariableFormat)?;
    if !matches!(format.color_family, ColorFamily::Gray | ColorFamily::Yuv) {
        return Err(FormatError::UnsupportedColorFamily {
            family: format!("{:?}", format.color_family),
        }
        .into());
    }
    chroma_modulus(format.subsampling_w, format.subsampling_h)?;
    Ok(format)
}

fn reference_plane<'a>(frame: &'a Frame, prefilter: Option<&'a Frame>) -> Result<&'a Plane> {
    let luma = frame.plane(0).ok_or(FormatError::VariableFormat)?;
    let Some(prefilter) = prefilter else {
        return Ok(luma);
    };
    let reference = prefilter.plane(0).ok_or(FormatError::VariableFormat)?;
    if reference.dimensions() != luma.dimensions() {
        return Err(FormatError::GeometryMismatch {
            expected: format!("prefilter luma {}x{}", luma.width(), luma.height()),
            actual: format!("{}x{}", reference.width(), reference.height()),
        }
        .into());
    }
    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GrainError;
    use crate::grain::GrainerMetadata;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct SpyGrainer {
        calls: AtomicUsize,
    }

    impl Grainer for SpyGrainer {
        fn name(&self) -> &str {
            "spy"
        }

        fn description(&self) -> &str {
            "Counts calls and adds nothing"
        }

        fn grain(&self, frame: &Frame, _strength: Strength) -> Result<Frame> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(frame.clone())
        }

        fn metadata(&self) -> GrainerMetadata {
            GrainerMetadata::default()
        }
    }

    /// Adds a fixed offset to the luma plane, scaled by the luma strength
    #[derive(Debug)]
    struct OffsetGrainer;

    impl Grainer for OffsetGrainer {
        fn name(&self) -> &str {
            "offset"
        }

        fn description(&self) -> &str {
            "Deterministic luma offset"
        }

        fn grain(&self, frame: &Frame, strength: Strength) -> Result<Frame> {
            let format = frame.format().copied().ok_or(FormatError::VariableFormat)?;
            let mut planes = frame.planes().to_vec();
            planes[0] = planes[0].map(|v| format.quantize(v + strength.luma));
            Frame::from_planes(format, planes)
        }
    }

    fn single_band(grainer: Arc<dyn Grainer>) -> Graigasm {
        Graigasm::new(
            vec![128.0],
            vec![Strength::new(10.0, 0.0)],
            vec![1.0],
            vec![50.0],
            PerBand::All(0.5),
            PerBand::All(grainer),
        )
        .unwrap()
    }

    fn gradient_frame() -> Frame {
        Frame::from_planes(
            VideoFormat::gray(8),
            vec![Plane::from_fn(256, 4, |x, _| x as f32)],
        )
        .unwrap()
    }

    #[test]
    fn test_any_length_mismatch_fails() {
        let result = Graigasm::new(
            vec![64.0, 128.0],
            vec![Strength::default(); 2],
            vec![1.0; 2],
            vec![50.0],
            PerBand::Unset,
            PerBand::Unset,
        );
        assert!(matches!(
            result,
            Err(GrainError::Configuration(ConfigurationError::LengthMismatch { .. }))
        ));
    }

    #[test]
    fn test_no_bands_fails() {
        let result = Graigasm::new(vec![], vec![], vec![], vec![], PerBand::Unset, PerBand::Unset);
        assert!(matches!(result, Err(GrainError::Configuration(ConfigurationError::NoBands))));
    }

    #[test]
    fn test_default_overflows_and_grainers() {
        let graigasm = Graigasm::new(
            vec![64.0, 128.0, 192.0, 240.0],
            vec![Strength::default(); 4],
            vec![1.0; 4],
            vec![50.0; 4],
            PerBand::Unset,
            PerBand::Unset,
        )
        .unwrap();
        assert!(graigasm.bands().iter().all(|b| b.overflow == 0.25));
        assert!(graigasm.bands().iter().all(|b| b.grainer.name() == "add"));
    }

    #[test]
    fn test_short_overflow_list_broadcasts() {
        let graigasm = Graigasm::new(
            vec![64.0, 128.0, 192.0],
            vec![Strength::default(); 3],
            vec![1.0; 3],
            vec![50.0; 3],
            PerBand::each([0.1, 0.3]),
            PerBand::Unset,
        )
        .unwrap();
        let overflows: Vec<f32> = graigasm.bands().iter().map(|b| b.overflow).collect();
        assert_eq!(overflows, vec![0.1, 0.3, 0.3]);
    }

    #[test]
    fn test_invalid_size_fails() {
        let result = Graigasm::new(
            vec![64.0],
            vec![Strength::default()],
            vec![0.0],
            vec![50.0],
            PerBand::Unset,
            PerBand::Unset,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_variable_format_rejected() {
        let graigasm = single_band(Arc::new(SpyGrainer::default()));
        let frame = Frame::with_unknown_format(vec![Plane::new_filled(8, 8, 0.0)]);
        assert!(matches!(
            graigasm.apply(&frame),
            Err(GrainError::Format(FormatError::VariableFormat))
        ));
    }

    #[test]
    fn test_rgb_rejected() {
        let graigasm = single_band(Arc::new(SpyGrainer::default()));
        let frame = Frame::blank(VideoFormat::rgb(8), 8, 8, &[0.0]).unwrap();
        assert!(matches!(
            graigasm.apply(&frame),
            Err(GrainError::Format(FormatError::UnsupportedColorFamily { .. }))
        ));
    }

    #[test]
    fn test_unsupported_subsampling_rejected() {
        let graigasm = single_band(Arc::new(SpyGrainer::default()));
        let frame = Frame::blank(VideoFormat::yuv(8, 2, 1), 16, 16, &[128.0]).unwrap();
        assert!(matches!(
            graigasm.apply(&frame),
            Err(GrainError::Configuration(ConfigurationError::UnsupportedSubsampling { .. }))
        ));
    }

    #[test]
    fn test_show_masks_never_grains() {
        let spy = Arc::new(SpyGrainer::default());
        let graigasm = Graigasm::new(
            vec![64.0, 192.0],
            vec![Strength::new(5.0, 0.0); 2],
            vec![1.0; 2],
            vec![50.0; 2],
            PerBand::All(0.1),
            PerBand::All(spy.clone() as Arc<dyn Grainer>),
        )
        .unwrap();

        let frame = gradient_frame();
        let output = graigasm
            .graining(&frame, GrainingOptions { prefilter: None, show_masks: true })
            .unwrap();
        let GrainingOutput::Masks(previews) = output else {
            panic!("expected masks");
        };
        assert_eq!(previews.len(), 2);
        assert_eq!(previews[0].label, "Threshold: 64");
        assert_eq!(previews[1].index, 1);
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);

        graigasm.apply(&frame).unwrap();
        assert_eq!(spy.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_show_masks_clip_interleaves() {
        let graigasm = Graigasm::new(
            vec![64.0, 192.0],
            vec![Strength::default(); 2],
            vec![1.0; 2],
            vec![50.0; 2],
            PerBand::All(0.1),
            PerBand::Unset,
        )
        .unwrap();
        let frames = vec![gradient_frame(), gradient_frame(), gradient_frame()];
        let previews = graigasm.show_masks_clip(&frames).unwrap();
        assert_eq!(previews.len(), 6);
        let indices: Vec<usize> = previews.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        let bands: Vec<usize> = previews.iter().map(|p| p.band).collect();
        assert_eq!(bands, vec![0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn test_prefilter_drives_masks() {
        let graigasm = single_band(Arc::new(SpyGrainer::default()));
        let frame = Frame::blank(VideoFormat::gray(8), 8, 8, &[250.0]).unwrap();
        let dark = Frame::blank(VideoFormat::gray(8), 8, 8, &[10.0]).unwrap();

        let own = graigasm.show_masks(&frame, None).unwrap();
        assert_eq!(own[0].mask.plane(0).unwrap().get(0, 0), 0.0);

        let pre = graigasm.show_masks(&frame, Some(&dark)).unwrap();
        assert_eq!(pre[0].mask.plane(0).unwrap().get(0, 0), 255.0);
    }

    #[test]
    fn test_prefilter_geometry_mismatch() {
        let graigasm = single_band(Arc::new(SpyGrainer::default()));
        let frame = Frame::blank(VideoFormat::gray(8), 8, 8, &[10.0]).unwrap();
        let small = Frame::blank(VideoFormat::gray(8), 4, 4, &[10.0]).unwrap();
        let options = GrainingOptions { prefilter: Some(&small), show_masks: false };
        assert!(graigasm.graining(&frame, options).is_err());
    }

    #[test]
    fn test_flat_frame_with_noop_grain_is_unchanged() {
        // The mask weights the band heavily at luma 100, but the grain adds nothing
        let graigasm = single_band(Arc::new(SpyGrainer::default()));
        let frame = Frame::blank(VideoFormat::gray(8), 64, 64, &[100.0]).unwrap();
        assert_eq!(graigasm.apply(&frame).unwrap(), frame);

        let zero_variance = Graigasm::new(
            vec![128.0],
            vec![Strength::new(0.0, 0.0)],
            vec![1.0],
            vec![50.0],
            PerBand::All(0.5),
            PerBand::All(Arc::new(AddGrain::new(0, false)) as Arc<dyn Grainer>),
        )
        .unwrap();
        assert_eq!(zero_variance.apply(&frame).unwrap(), frame);
    }

    #[test]
    fn test_zero_strength_bands_are_neutral() {
        let graigasm = Graigasm::new(
            vec![64.0, 192.0],
            vec![Strength::new(0.0, 0.0); 2],
            vec![1.0, 1.5],
            vec![50.0, 80.0],
            PerBand::All(0.1),
            PerBand::Unset,
        )
        .unwrap();
        let frame = Frame::from_planes(
            VideoFormat::yuv(8, 1, 1),
            vec![
                Plane::from_fn(64, 32, |x, y| ((x * 4 + y) % 256) as f32),
                Plane::new_filled(32, 16, 110.0),
                Plane::new_filled(32, 16, 140.0),
            ],
        )
        .unwrap();
        assert_eq!(graigasm.apply(&frame).unwrap(), frame);
    }

    #[test]
    fn test_band_order_changes_output() {
        let offset: Arc<dyn Grainer> = Arc::new(OffsetGrainer);
        let build = |thresholds: Vec<f32>, strengths: Vec<Strength>| {
            Graigasm::new(
                thresholds,
                strengths,
                vec![1.0; 2],
                vec![50.0; 2],
                PerBand::All(0.2),
                PerBand::All(offset.clone()),
            )
            .unwrap()
        };
        let forward = build(vec![64.0, 192.0], vec![Strength::new(6.0, 0.0), Strength::new(20.0, 0.0)]);
        let swapped = build(vec![192.0, 64.0], vec![Strength::new(20.0, 0.0), Strength::new(6.0, 0.0)]);

        let frame = gradient_frame();
        let a = forward.apply(&frame).unwrap();
        let b = swapped.apply(&frame).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_masks_confine_grain_to_band() {
        let offset: Arc<dyn Grainer> = Arc::new(OffsetGrainer);
        let graigasm = Graigasm::new(
            vec![100.0],
            vec![Strength::new(10.0, 0.0)],
            vec![1.0],
            vec![50.0],
            PerBand::All(0.0),
            PerBand::All(offset),
        )
        .unwrap();
        let frame = gradient_frame();
        let out = graigasm.apply(&frame).unwrap();
        let plane = out.plane(0).unwrap();
        // Below the threshold the layer (source minus offset) is applied in full
        assert_eq!(plane.get(50, 0), 40.0);
        // Above it the source is untouched
        assert_eq!(plane.get(200, 0), 200.0);
    }

    #[test]
    fn test_float_frames_are_processed() {
        let graigasm = Graigasm::new(
            vec![0.5],
            vec![Strength::new(0.0, 0.0)],
            vec![1.0],
            vec![50.0],
            PerBand::Unset,
            PerBand::Unset,
        )
        .unwrap();
        let frame = Frame::blank(VideoFormat::yuv_float(1, 1), 16, 16, &[0.3, 0.0, 0.0]).unwrap();
        let out = graigasm.apply(&frame).unwrap();
        let plane = out.plane(0).unwrap();
        assert!(plane.samples().iter().all(|v| (v - 0.3).abs() < 1e-5));
    }
}

// Conversion between still images and planar frames, used by the CLI.

use image::{DynamicImage, ImageBuffer, Luma, Rgb};

use crate::error::{FormatError, Result};
use crate::video::types::{ColorFamily, Frame, Plane, VideoFormat};

// BT.601 full-range coefficients
const KR: f32 = 0.299;
const KB: f32 = 0.114;
const KG: f32 = 1.0 - KR - KB;

impl Frame {
    /// Build a frame from a decoded image
    ///
    /// Grayscale images keep their bit depth as a GRAY frame; anything with
    /// color becomes an 8-bit YUV 4:4:4 frame.
    pub fn from_dynamic_image(image: &DynamicImage) -> Result<Self> {
        match image {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageLumaA8(_) => {
                let luma = image.to_luma8();
                let plane = Plane::from_fn(luma.width(), luma.height(), |x, y| luma.get_pixel(x, y)[0] as f32);
                Frame::from_planes(VideoFormat::gray(8), vec![plane])
            }
            DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_) => {
                let luma = image.to_luma16();
                let plane = Plane::from_fn(luma.width(), luma.height(), |x, y| luma.get_pixel(x, y)[0] as f32);
                Frame::from_planes(VideoFormat::gray(16), vec![plane])
            }
            _ => {
                let rgb = image.to_rgb8();
                let (w, h) = rgb.dimensions();
                let mut y_plane = Plane::new_filled(w, h, 0.0);
                let mut u_plane = Plane::new_filled(w, h, 0.0);
                let mut v_plane = Plane::new_filled(w, h, 0.0);
                for (x, yy, px) in rgb.enumerate_pixels() {
                    let (luma, cb, cr) = rgb_to_ycbcr(px[0] as f32, px[1] as f32, px[2] as f32);
                    y_plane.set(x, yy, luma.round().clamp(0.0, 255.0));
                    u_plane.set(x, yy, cb.round().clamp(0.0, 255.0));
                    v_plane.set(x, yy, cr.round().clamp(0.0, 255.0));
                }
                Frame::from_planes(VideoFormat::yuv(8, 0, 0), vec![y_plane, u_plane, v_plane])
            }
        }
    }

    /// Convert back to an image; only 4:4:4 integer YUV and GRAY frames are supported
    pub fn to_dynamic_image(&self) -> Result<DynamicImage> {
        let format = self.format().copied().ok_or(FormatError::VariableFormat)?;
        let (w, h) = (self.width(), self.height());
        let planes = self.planes();

        match (format.color_family, format.is_float()) {
            (ColorFamily::Gray, false) if format.bits_per_sample <= 8 => {
                let scale = 255.0 / format.peak();
                let img = ImageBuffer::from_fn(w, h, |x, y| {
                    Luma([(planes[0].get(x, y) * scale).round().clamp(0.0, 255.0) as u8])
                });
                Ok(DynamicImage::ImageLuma8(img))
            }
            (ColorFamily::Gray, false) => {
                let scale = 65535.0 / format.peak();
                let img = ImageBuffer::from_fn(w, h, |x, y| {
                    Luma([(planes[0].get(x, y) * scale).round().clamp(0.0, 65535.0) as u16])
                });
                Ok(DynamicImage::ImageLuma16(img))
            }
            (ColorFamily::Yuv, false) if format.subsampling_w == 0 && format.subsampling_h == 0 => {
                let scale = 255.0 / format.peak();
                let img = ImageBuffer::from_fn(w, h, |x, y| {
                    let (r, g, b) = ycbcr_to_rgb(
                        planes[0].get(x, y) * scale,
                        planes[1].get(x, y) * scale,
                        planes[2].get(x, y) * scale,
                    );
                    Rgb([to_u8(r), to_u8(g), to_u8(b)])
                });
                Ok(DynamicImage::ImageRgb8(img))
            }
            _ => Err(FormatError::UnsupportedColorFamily {
                family: format!("{:?} (image export)", format.color_family),
            }
            .into()),
        }
    }
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn rgb_to_ycbcr(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let y = KR * r + KG * g + KB * b;
    let cb = 128.0 + (b - y) / (2.0 * (1.0 - KB));
    let cr = 128.0 + (r - y) / (2.0 * (1.0 - KR));
    (y, cb, cr)
}

fn ycbcr_to_rgb(y: f32, cb: f32, cr: f32) -> (f32, f32, f32) {
    let r = y + 2.0 * (1.0 - KR) * (cr - 128.0);
    let b = y + 2.0 * (1.0 - KB) * (cb - 128.0);
    let g = (y - KR * r - KB * b) / KG;
    (r, g, b)
}

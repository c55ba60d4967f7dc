//! Interleaved 8-bit RGBA pixel buffers and luminance/chrominance separation.
//!
//! Both engines operate on a single luminance plane extracted with BT.709
//! weights and rebuild color afterwards, either by scaling R/G/B with the
//! ratio of new to original luminance or by broadcasting the new luminance.
//!
//! # Coordinate System
//!
//! - **RgbaBuffer**: row-major, top-to-bottom, 4 samples per pixel
//! - **Luminance plane**: ndarray `Array2<f32>` with (height, width) dimensions,
//!   indexed `[row, col]` = `[y, x]`

use crate::error::StretchError;
use image::RgbaImage;
use ndarray::{Array2, ArrayView2};

/// Sample count of a `width` x `height` RGBA image, rejecting empty images
/// and sizes that overflow `usize`.
fn sample_count(width: usize, height: usize) -> Result<usize, StretchError> {
    if width == 0 || height == 0 {
        return Err(StretchError::EmptyImage { width, height });
    }
    width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(CHANNELS))
        .ok_or(StretchError::ImageTooLarge { width, height })
}

/// Dimensions as the `u32` pair the `image` crate expects.
fn codec_dimensions(width: usize, height: usize) -> Result<(u32, u32), StretchError> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(StretchError::ImageTooLarge { width, height }),
    }
}

/// BT.709 luma weights for R, G and B.
pub const LUMINANCE_WEIGHTS: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Pixels with original luminance at or below this level are treated as
/// achromatic: the new luminance is broadcast instead of ratio-scaled.
pub const ACHROMATIC_THRESHOLD: f32 = 0.001;

/// Number of interleaved samples per pixel.
pub const CHANNELS: usize = 4;

/// Rectangular image of interleaved R, G, B, A samples.
///
/// Construction validates that the buffer is non-empty and that the sample
/// count matches the dimensions, so the engines never see a malformed buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl RgbaBuffer {
    /// Wrap raw RGBA samples.
    ///
    /// # Errors
    /// * `StretchError::EmptyImage` - width or height is zero
    /// * `StretchError::ImageTooLarge` - `width * height * 4` overflows `usize`
    /// * `StretchError::BufferSizeMismatch` - `data.len() != width * height * 4`
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, StretchError> {
        let expected = sample_count(width, height)?;
        if data.len() != expected {
            return Err(StretchError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a buffer where every pixel has the same RGBA value.
    pub fn filled(width: usize, height: usize, rgba: [u8; 4]) -> Result<Self, StretchError> {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(sample_count(width, height)?)
            .collect();
        Self::new(width, height, data)
    }

    /// Copy an `image` crate RGBA buffer.
    pub fn from_rgba_image(image: &RgbaImage) -> Result<Self, StretchError> {
        Self::new(
            image.width() as usize,
            image.height() as usize,
            image.as_raw().clone(),
        )
    }

    /// Convert into an `image` crate RGBA buffer for encoding.
    ///
    /// # Errors
    /// * `StretchError::ImageTooLarge` - a dimension does not fit in `u32`
    pub fn into_rgba_image(self) -> Result<RgbaImage, StretchError> {
        let (width, height) = codec_dimensions(self.width, self.height)?;
        let expected = self.width * self.height * CHANNELS;
        let actual = self.data.len();
        RgbaImage::from_raw(width, height, self.data)
            .ok_or(StretchError::BufferSizeMismatch { expected, actual })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Dimensions as (height, width), matching ndarray plane shapes.
    pub fn dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Raw interleaved samples.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// RGBA value of the pixel at column `x`, row `y`.
    ///
    /// # Panics
    /// Panics if the coordinate is outside the image.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "Pixel out of bounds");
        let idx = (y * self.width + x) * CHANNELS;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Iterate over pixels as 4-sample slices.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(CHANNELS)
    }
}

/// Luminance of normalized R, G, B values.
pub fn rgb_to_luminance(r: f32, g: f32, b: f32) -> f32 {
    LUMINANCE_WEIGHTS[0] * r + LUMINANCE_WEIGHTS[1] * g + LUMINANCE_WEIGHTS[2] * b
}

/// Extract the normalized [0, 1] luminance plane of an RGBA buffer.
///
/// Alpha does not contribute to luminance.
pub fn extract_luminance(image: &RgbaBuffer) -> Array2<f32> {
    let values = image
        .pixels()
        .map(|px| {
            rgb_to_luminance(
                px[0] as f32 / 255.0,
                px[1] as f32 / 255.0,
                px[2] as f32 / 255.0,
            )
        })
        .collect();
    // Length matches by construction of RgbaBuffer
    Array2::from_shape_vec(image.dim(), values).unwrap_or_else(|_| Array2::zeros(image.dim()))
}

fn to_channel(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Rebuild an RGBA buffer from a processed luminance plane.
///
/// When `preserve_color` is set and a pixel's original luminance exceeds
/// [`ACHROMATIC_THRESHOLD`], its R, G and B are multiplied by
/// `new_lum / original_lum`, which keeps chrominance ratios. Otherwise the new
/// luminance is written to all three channels. Every channel is clamped to
/// [0, 255]; alpha is copied unchanged.
///
/// # Panics
/// Panics if either plane's shape differs from the image's (height, width).
pub fn reconstruct_color(
    image: &RgbaBuffer,
    original_luminance: &ArrayView2<f32>,
    new_luminance: &ArrayView2<f32>,
    preserve_color: bool,
) -> RgbaBuffer {
    assert_eq!(
        original_luminance.dim(),
        image.dim(),
        "Original luminance plane must match image dimensions"
    );
    assert_eq!(
        new_luminance.dim(),
        image.dim(),
        "New luminance plane must match image dimensions"
    );

    let mut data = Vec::with_capacity(image.data.len());
    for ((px, &orig), &new) in image
        .pixels()
        .zip(original_luminance.iter())
        .zip(new_luminance.iter())
    {
        if preserve_color && orig > ACHROMATIC_THRESHOLD {
            let scale = new / orig;
            for &c in &px[..3] {
                data.push(to_channel(c as f32 / 255.0 * scale));
            }
        } else {
            let v = to_channel(new);
            data.extend_from_slice(&[v, v, v]);
        }
        data.push(px[3]);
    }

    RgbaBuffer {
        width: image.width,
        height: image.height,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_rejects_empty() {
        assert!(matches!(
            RgbaBuffer::new(0, 4, vec![]),
            Err(StretchError::EmptyImage {
                width: 0,
                height: 4
            })
        ));
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = RgbaBuffer::new(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            StretchError::BufferSizeMismatch {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn test_pixel_indexing_is_row_major() {
        let data: Vec<u8> = (0..24).collect();
        let buf = RgbaBuffer::new(3, 2, data).unwrap();
        assert_eq!(buf.pixel(0, 0), [0, 1, 2, 3]);
        assert_eq!(buf.pixel(2, 0), [8, 9, 10, 11]);
        assert_eq!(buf.pixel(0, 1), [12, 13, 14, 15]);
    }

    #[test]
    fn test_luminance_weights() {
        let white = RgbaBuffer::filled(1, 1, [255, 255, 255, 0]).unwrap();
        assert_relative_eq!(extract_luminance(&white)[[0, 0]], 1.0, epsilon = 1e-6);

        let green = RgbaBuffer::filled(1, 1, [0, 255, 0, 255]).unwrap();
        assert_relative_eq!(extract_luminance(&green)[[0, 0]], 0.7152, epsilon = 1e-6);
    }

    #[test]
    fn test_luminance_plane_shape() {
        let buf = RgbaBuffer::filled(5, 3, [10, 20, 30, 40]).unwrap();
        assert_eq!(extract_luminance(&buf).dim(), (3, 5));
    }

    #[test]
    fn test_reconstruct_preserves_ratios_and_alpha() {
        let buf = RgbaBuffer::filled(1, 1, [100, 50, 20, 77]).unwrap();
        let orig = extract_luminance(&buf);
        let doubled = orig.mapv(|v| v * 2.0);
        let out = reconstruct_color(&buf, &orig.view(), &doubled.view(), true);
        assert_eq!(out.pixel(0, 0), [200, 100, 40, 77]);
    }

    #[test]
    fn test_reconstruct_clamps_overshoot() {
        let buf = RgbaBuffer::filled(1, 1, [200, 100, 100, 255]).unwrap();
        let orig = extract_luminance(&buf);
        let bright = orig.mapv(|v| v * 4.0);
        let out = reconstruct_color(&buf, &orig.view(), &bright.view(), true);
        assert_eq!(out.pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_reconstruct_broadcasts_dark_pixels() {
        let buf = RgbaBuffer::filled(1, 1, [0, 0, 0, 12]).unwrap();
        let orig = extract_luminance(&buf);
        let lifted = Array2::from_elem((1, 1), 0.5f32);
        let out = reconstruct_color(&buf, &orig.view(), &lifted.view(), true);
        assert_eq!(out.pixel(0, 0), [128, 128, 128, 12]);
    }

    #[test]
    fn test_reconstruct_without_color_is_gray() {
        let buf = RgbaBuffer::filled(2, 1, [255, 0, 0, 200]).unwrap();
        let orig = extract_luminance(&buf);
        let out = reconstruct_color(&buf, &orig.view(), &orig.view(), false);
        let v = to_channel(0.2126);
        assert_eq!(out.pixel(1, 0), [v, v, v, 200]);
    }

    #[test]
    fn test_rgba_image_roundtrip() {
        let buf = RgbaBuffer::filled(4, 2, [1, 2, 3, 4]).unwrap();
        let img = buf.clone().into_rgba_image().unwrap();
        assert_eq!(img.dimensions(), (4, 2));
        assert_eq!(RgbaBuffer::from_rgba_image(&img).unwrap(), buf);
    }

    #[test]
    fn test_overflowing_dimensions_are_rejected() {
        assert!(matches!(
            RgbaBuffer::new(usize::MAX, 2, vec![]),
            Err(StretchError::ImageTooLarge {
                width: usize::MAX,
                height: 2
            })
        ));
        // width * height fits but the channel multiply does not
        let width = usize::MAX / 2;
        assert!(matches!(
            RgbaBuffer::filled(width, 2, [0, 0, 0, 255]),
            Err(StretchError::ImageTooLarge { height: 2, .. })
        ));
    }

    #[test]
    fn test_codec_dimensions_must_fit_u32() {
        assert_eq!(codec_dimensions(640, 480).unwrap(), (640, 480));
        let wide = u32::MAX as usize + 1;
        assert!(matches!(
            codec_dimensions(wide, 1),
            Err(StretchError::ImageTooLarge { width, height: 1 }) if width == wide
        ));
        assert!(matches!(
            codec_dimensions(1, wide),
            Err(StretchError::ImageTooLarge { width: 1, .. })
        ));
    }
}

//! Shape-checked floating point image buffers.
//!
//! Samples are stored row-major with channels interleaved, so the sample for
//! channel `c` of pixel `(x, y)` lives at `(y * width + x) * channels + c`.
//! Buffers are widened from 8-bit data on the way in and narrowed back to
//! 8-bit data on the way out; everything in between works on `f32`.

use crate::error::{EngineError, EngineResult};
use crate::luminance::gray_level;

/// A rectangular buffer of pixel samples with 1 (gray) or 3 (RGB) channels.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<f32>,
}

impl ImageBuffer {
    /// Create a buffer from raw samples, validating the shape.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidShape`] if a dimension is zero, the
    /// channel count is not 1 or 3, or `data.len()` does not equal
    /// `height * width * channels`.
    pub fn new(height: usize, width: usize, channels: usize, data: Vec<f32>) -> EngineResult<Self> {
        validate_shape(height, width, channels)?;
        let expected = height * width * channels;
        if data.len() != expected {
            return Err(EngineError::InvalidShape(format!(
                "expected {} samples for {}x{}x{}, got {}",
                expected,
                height,
                width,
                channels,
                data.len()
            )));
        }
        Ok(Self {
            height,
            width,
            channels,
            data,
        })
    }

    /// Create a buffer filled with a single value.
    pub fn filled(height: usize, width: usize, channels: usize, value: f32) -> EngineResult<Self> {
        validate_shape(height, width, channels)?;
        Ok(Self {
            height,
            width,
            channels,
            data: vec![value; height * width * channels],
        })
    }

    /// Widen row-major 8-bit samples into a buffer.
    pub fn from_u8(height: usize, width: usize, channels: usize, pixels: &[u8]) -> EngineResult<Self> {
        Self::new(
            height,
            width,
            channels,
            pixels.iter().map(|&v| v as f32).collect(),
        )
    }

    /// Create a 3-channel buffer from an `image::RgbImage`.
    pub fn from_rgb_image(img: &image::RgbImage) -> EngineResult<Self> {
        let (width, height) = img.dimensions();
        Self::from_u8(height as usize, width as usize, 3, img.as_raw())
    }

    /// Create a 1-channel buffer from an `image::GrayImage`.
    pub fn from_gray_image(img: &image::GrayImage) -> EngineResult<Self> {
        let (width, height) = img.dimensions();
        Self::from_u8(height as usize, width as usize, 1, img.as_raw())
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of interleaved channels (1 or 3).
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of pixels (`height * width`).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.height * self.width
    }

    /// `true` for single-channel buffers.
    #[inline]
    pub fn is_gray(&self) -> bool {
        self.channels == 1
    }

    /// All samples in row-major interleaved order.
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.data
    }

    /// Mutable access to all samples.
    #[inline]
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consume the buffer and return its samples.
    pub fn into_samples(self) -> Vec<f32> {
        self.data
    }

    /// Sample at `(x, y, c)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize, c: usize) -> f32 {
        self.data[(y * self.width + x) * self.channels + c]
    }

    /// Build a buffer of the same shape from new samples.
    ///
    /// Internal constructor for operations that compute `data` with the
    /// exact length of `self`.
    pub(crate) fn with_samples(&self, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), self.data.len(), "Sample buffer size mismatch");
        Self {
            height: self.height,
            width: self.width,
            channels: self.channels,
            data,
        }
    }

    /// Return a copy with every sample mapped through `f`.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        self.with_samples(self.data.iter().map(|&v| f(v)).collect())
    }

    /// Reduce to a single gray channel.
    ///
    /// Gray buffers are returned unchanged; RGB buffers are converted with
    /// BT.601 luma weights and rounded to whole levels.
    pub fn to_gray(&self) -> Self {
        if self.is_gray() {
            return self.clone();
        }
        let data = self
            .data
            .chunks_exact(3)
            .map(|px| gray_level(px[0], px[1], px[2]))
            .collect();
        Self {
            height: self.height,
            width: self.width,
            channels: 1,
            data,
        }
    }

    /// Expand to three channels by replicating the gray channel.
    pub fn to_rgb(&self) -> Self {
        if !self.is_gray() {
            return self.clone();
        }
        let data = self.data.iter().flat_map(|&v| [v, v, v]).collect();
        Self {
            height: self.height,
            width: self.width,
            channels: 3,
            data,
        }
    }

    /// Narrow to 8-bit samples by clamping to [0, 255] and truncating.
    pub fn to_u8(&self) -> Vec<u8> {
        self.data.iter().map(|&v| narrow_sample(v)).collect()
    }

    /// Convert to an `image::RgbImage`, expanding gray buffers.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        let rgb = self.to_rgb();
        image::RgbImage::from_raw(self.width as u32, self.height as u32, rgb.to_u8())
    }

    /// Convert to an `image::GrayImage`, reducing RGB buffers.
    pub fn to_gray_image(&self) -> Option<image::GrayImage> {
        let gray = self.to_gray();
        image::GrayImage::from_raw(self.width as u32, self.height as u32, gray.to_u8())
    }

    /// Minimum and maximum over all samples.
    pub fn min_max(&self) -> (f32, f32) {
        min_max(&self.data)
    }
}

/// Check the shape invariants shared by every buffer.
pub fn validate_shape(height: usize, width: usize, channels: usize) -> EngineResult<()> {
    if height == 0 || width == 0 {
        return Err(EngineError::InvalidShape(format!(
            "dimensions must be non-zero, got {}x{}",
            height, width
        )));
    }
    if channels != 1 && channels != 3 {
        return Err(EngineError::InvalidShape(format!(
            "channel count must be 1 or 3, got {}",
            channels
        )));
    }
    Ok(())
}

/// Clamp a sample to the byte range and truncate.
#[inline]
pub fn narrow_sample(v: f32) -> u8 {
    // NaN casts to 0
    v.clamp(0.0, 255.0) as u8
}

/// Minimum and maximum of a non-empty slice; `(0, 0)` for an empty one.
pub(crate) fn min_max(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_creation() {
        let buf = ImageBuffer::new(2, 3, 3, vec![0.0; 18]).unwrap();
        assert_eq!(buf.height(), 2);
        assert_eq!(buf.width(), 3);
        assert_eq!(buf.channels(), 3);
        assert_eq!(buf.pixel_count(), 6);
        assert!(!buf.is_gray());
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        let err = ImageBuffer::new(0, 3, 1, vec![]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidShape(_)));

        let err = ImageBuffer::filled(3, 0, 1, 0.0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidShape(_)));
    }

    #[test]
    fn test_rejects_bad_channel_count() {
        for channels in [0, 2, 4] {
            let err = ImageBuffer::filled(2, 2, channels, 0.0).unwrap_err();
            assert!(matches!(err, EngineError::InvalidShape(_)));
        }
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let err = ImageBuffer::new(2, 2, 3, vec![0.0; 11]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidShape(_)));
    }

    #[test]
    fn test_from_u8_widens() {
        let buf = ImageBuffer::from_u8(1, 2, 1, &[7, 250]).unwrap();
        assert_eq!(buf.samples(), &[7.0, 250.0]);
    }

    #[test]
    fn test_get_indexing() {
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let buf = ImageBuffer::new(2, 2, 3, data).unwrap();
        // pixel (1, 1) starts at (1 * 2 + 1) * 3 = 9
        assert_eq!(buf.get(1, 1, 0), 9.0);
        assert_eq!(buf.get(1, 1, 2), 11.0);
        assert_eq!(buf.get(0, 1, 1), 7.0);
    }

    #[test]
    fn test_to_gray_and_back() {
        let buf = ImageBuffer::from_u8(1, 2, 3, &[100, 100, 100, 255, 0, 0]).unwrap();
        let gray = buf.to_gray();
        assert_eq!(gray.channels(), 1);
        assert_eq!(gray.samples(), &[100.0, 76.0]);

        let rgb = gray.to_rgb();
        assert_eq!(rgb.channels(), 3);
        assert_eq!(rgb.samples(), &[100.0, 100.0, 100.0, 76.0, 76.0, 76.0]);
    }

    #[test]
    fn test_to_u8_clamps_and_truncates() {
        let buf = ImageBuffer::new(1, 4, 1, vec![-5.0, 12.9, 255.5, 300.0]).unwrap();
        assert_eq!(buf.to_u8(), vec![0, 12, 255, 255]);
    }

    #[test]
    fn test_image_crate_round_trip() {
        let img = image::RgbImage::from_raw(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let buf = ImageBuffer::from_rgb_image(&img).unwrap();
        assert_eq!(buf.height(), 1);
        assert_eq!(buf.width(), 2);
        assert_eq!(buf.to_rgb_image().unwrap(), img);

        let gray = image::GrayImage::from_raw(1, 2, vec![9, 10]).unwrap();
        let buf = ImageBuffer::from_gray_image(&gray).unwrap();
        assert_eq!(buf.height(), 2);
        assert_eq!(buf.to_gray_image().unwrap(), gray);
    }

    #[test]
    fn test_min_max() {
        let buf = ImageBuffer::new(1, 3, 1, vec![4.0, -2.0, 9.5]).unwrap();
        assert_eq!(buf.min_max(), (-2.0, 9.5));
        assert_eq!(min_max(&[]), (0.0, 0.0));
    }
}

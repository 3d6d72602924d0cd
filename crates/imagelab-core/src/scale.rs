//! Normalization of arbitrary-valued samples into the displayable byte range.
//!
//! Two policies are provided:
//!
//! - [`rescale_to_255`] stretches the observed `[min, max]` onto `[0, 255]`.
//!   A buffer whose samples are all equal has no range to stretch and maps
//!   to all zeros.
//! - [`clip_to_255`] clamps each sample to `[0, 255]` and truncates.
//!
//! Both return buffers whose samples are whole byte levels stored as `f32`.

use crate::buffer::{min_max, ImageBuffer};

/// Linearly rescale every sample of `buffer` into `[0, 255]`.
///
/// Each value `v` maps to `round(255 * (v - min) / (max - min))`. The
/// minimum sample becomes 0 and the maximum 255. When `max == min` the
/// result is all zeros.
pub fn rescale_to_255(buffer: &ImageBuffer) -> ImageBuffer {
    buffer.with_samples(rescale_samples(buffer.samples()))
}

/// Clamp every sample of `buffer` to `[0, 255]` and truncate.
pub fn clip_to_255(buffer: &ImageBuffer) -> ImageBuffer {
    buffer.map(clip_sample)
}

/// Rescale a slice of samples into `[0, 255]`.
///
/// This is the slice form of [`rescale_to_255`], also used to turn a
/// cumulative histogram into an equalization table.
pub fn rescale_samples(values: &[f32]) -> Vec<f32> {
    let (lo, hi) = min_max(values);
    if hi == lo || !(hi - lo).is_finite() {
        return vec![0.0; values.len()];
    }
    // Work in f64 so wide ranges do not lose the endpoints
    let lo = lo as f64;
    let span = hi as f64 - lo;
    values
        .iter()
        .map(|&v| (255.0 * (v as f64 - lo) / span).round().clamp(0.0, 255.0) as u8 as f32)
        .collect()
}

/// Clamp a single sample to `[0, 255]` and truncate toward zero.
#[inline]
pub fn clip_sample(v: f32) -> f32 {
    v.clamp(0.0, 255.0).trunc()
}

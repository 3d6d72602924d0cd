//! Zero-padded spatial convolution.
//!
//! Every channel is filtered independently: the neighbourhood of each
//! sample is weighted by the kernel, summed, and multiplied by the kernel
//! factor. Samples outside the image read as 0. The kernel is applied as
//! laid out (correlation), which is what the directional operators expect.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::buffer::ImageBuffer;
use crate::kernel::Kernel;
use crate::scale::{clip_to_255, rescale_to_255};

/// How the raw filter response is brought back into byte range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Stretch the response onto `[0, 255]`.
    #[default]
    Rescale,
    /// Clamp to `[0, 255]` and truncate.
    Clip,
    /// Keep the unbounded response.
    Raw,
}

/// Convolve `buffer` with `kernel` and normalize the result per `mode`.
///
/// # Arguments
/// * `buffer` - Gray or RGB input
/// * `kernel` - Square kernel with odd side length
/// * `mode` - Output normalization
///
/// # Returns
/// A buffer with the same shape as `buffer`.
pub fn convolve(buffer: &ImageBuffer, kernel: &Kernel, mode: OutputMode) -> ImageBuffer {
    let raw = convolve_raw(buffer, kernel);
    match mode {
        OutputMode::Rescale => rescale_to_255(&raw),
        OutputMode::Clip => clip_to_255(&raw),
        OutputMode::Raw => raw,
    }
}

/// Unnormalized convolution: weighted sum times factor, no range policy.
pub fn convolve_raw(buffer: &ImageBuffer, kernel: &Kernel) -> ImageBuffer {
    let (height, width, channels) = (buffer.height(), buffer.width(), buffer.channels());
    let k = kernel.size();
    let r = kernel.radius();
    let weights = kernel.weights();
    let factor = kernel.factor();

    trace!(height, width, channels, size = k, "convolving");

    let mut out = vec![0.0f32; buffer.samples().len()];
    for c in 0..channels {
        let plane = PaddedPlane::new(buffer, c, r);
        for y in 0..height {
            for x in 0..width {
                let mut acc = 0.0f32;
                for ky in 0..k {
                    let row = plane.row(y + ky, x, k);
                    let wrow = &weights[ky * k..(ky + 1) * k];
                    for (v, w) in row.iter().zip(wrow) {
                        acc += v * w;
                    }
                }
                out[(y * width + x) * channels + c] = acc * factor;
            }
        }
    }

    buffer.with_samples(out)
}

/// One channel of a buffer surrounded by a zero border of `radius` samples.
pub(crate) struct PaddedPlane {
    data: Vec<f32>,
    stride: usize,
}

impl PaddedPlane {
    pub(crate) fn new(buffer: &ImageBuffer, channel: usize, radius: usize) -> Self {
        let (height, width, channels) = (buffer.height(), buffer.width(), buffer.channels());
        let stride = width + 2 * radius;
        let mut data = vec![0.0f32; stride * (height + 2 * radius)];
        let samples = buffer.samples();
        for y in 0..height {
            let dst = (y + radius) * stride + radius;
            for x in 0..width {
                data[dst + x] = samples[(y * width + x) * channels + channel];
            }
        }
        Self { data, stride }
    }

    /// `len` samples of padded row `py` starting at padded column `px`.
    #[inline]
    pub(crate) fn row(&self, py: usize, px: usize, len: usize) -> &[f32] {
        let start = py * self.stride + px;
        &self.data[start..start + len]
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: convolution preserves shape for every output mode.
        #[test]
        fn prop_shape_preserved(
            height in 1usize..8,
            width in 1usize..8,
            rgb in any::<bool>(),
            size in prop::sample::select(vec![1usize, 3, 5]),
        ) {
            let channels = if rgb { 3 } else { 1 };
            let buf = ImageBuffer::filled(height, width, channels, 17.0).unwrap();
            let k = crate::kernel::make(crate::kernel::KernelKind::Mean, size).unwrap();
            for mode in [OutputMode::Rescale, OutputMode::Clip, OutputMode::Raw] {
                let out = convolve(&buf, &k, mode);
                prop_assert_eq!(out.height(), height);
                prop_assert_eq!(out.width(), width);
                prop_assert_eq!(out.channels(), channels);
            }
        }

        /// Property: rescaled output stays in byte range.
        #[test]
        fn prop_rescaled_in_range(values in prop::collection::vec(0.0f32..=255.0, 16)) {
            let buf = ImageBuffer::new(4, 4, 1, values).unwrap();
            let k = crate::kernel::make(crate::kernel::KernelKind::Laplacian, 3).unwrap();
            let out = convolve(&buf, &k, OutputMode::Rescale);
            for &v in out.samples() {
                prop_assert!((0.0..=255.0).contains(&v));
            }
        }
    }
}

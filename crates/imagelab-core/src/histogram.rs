//! Histogram computation and histogram equalization.
//!
//! [`compute_histogram`] bins a byte-valued buffer for display.
//! [`EqualizationLut`] spreads a single channel's intensities over the full
//! byte range using its cumulative distribution.

use tracing::debug;

use crate::buffer::{narrow_sample, ImageBuffer};
use crate::error::{EngineError, EngineResult};
use crate::luminance::gray_level;
use crate::Histogram;

/// Compute red, green, blue and gray histograms of a buffer.
///
/// Samples are narrowed to bytes before binning. A gray buffer bins its
/// single channel into all four histograms.
///
/// # Arguments
/// * `buffer` - Gray or RGB buffer
///
/// # Returns
/// A `Histogram` with all four channels populated.
pub fn compute_histogram(buffer: &ImageBuffer) -> Histogram {
    let mut hist = Histogram::new();

    if buffer.is_gray() {
        for &v in buffer.samples() {
            let level = narrow_sample(v) as usize;
            hist.red[level] += 1;
            hist.green[level] += 1;
            hist.blue[level] += 1;
            hist.gray[level] += 1;
        }
        return hist;
    }

    for chunk in buffer.samples().chunks_exact(3) {
        let r = narrow_sample(chunk[0]);
        let g = narrow_sample(chunk[1]);
        let b = narrow_sample(chunk[2]);

        hist.red[r as usize] += 1;
        hist.green[g as usize] += 1;
        hist.blue[b as usize] += 1;

        let gray = gray_level(r as f32, g as f32, b as f32);
        hist.gray[gray as usize] += 1;
    }

    hist
}

/// Absolute frequency of each byte level in `samples`.
pub fn level_counts(samples: &[f32]) -> [u64; 256] {
    let mut counts = [0u64; 256];
    for &v in samples {
        counts[narrow_sample(v) as usize] += 1;
    }
    counts
}

/// Histogram equalization lookup table.
///
/// Entry `i` is the cumulative relative frequency of levels `0..=i`,
/// linearly stretched so that the darkest level present maps to 0 and the
/// brightest to 255. Levels below the darkest present level map to 0 and
/// levels above the brightest to 255, which keeps the table non-decreasing.
/// When only one level is present there is no range to stretch and the
/// table is all zeros.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualizationLut {
    /// Lookup table: output = table[input]
    pub table: [u8; 256],
}

impl EqualizationLut {
    /// Build the table from the samples of a single channel.
    ///
    /// # Errors
    ///
    /// [`EngineError::EmptyHistogramInput`] if `samples` is empty.
    pub fn from_samples(samples: &[f32]) -> EngineResult<Self> {
        if samples.is_empty() {
            return Err(EngineError::EmptyHistogramInput);
        }
        let counts = level_counts(samples);
        let total = samples.len() as u64;

        let mut cumulative = [0u64; 256];
        let mut running = 0u64;
        for (cum, &count) in cumulative.iter_mut().zip(counts.iter()) {
            running += count;
            *cum = running;
        }

        // cumulative frequency at the darkest present level; the brightest
        // present level always reaches `total`
        let first = counts.iter().position(|&c| c > 0).unwrap_or(0);
        let lo = cumulative[first];
        let span = total - lo;

        let mut table = [0u8; 256];
        if span > 0 {
            for (entry, &cum) in table.iter_mut().zip(cumulative.iter()) {
                let v = 255.0 * cum.saturating_sub(lo) as f64 / span as f64;
                *entry = v.round().clamp(0.0, 255.0) as u8;
            }
        }

        Ok(Self { table })
    }

    /// Map one byte level through the table.
    #[inline]
    pub fn apply(&self, level: u8) -> u8 {
        self.table[level as usize]
    }

    /// Check that the table never decreases.
    pub fn is_monotonic(&self) -> bool {
        self.table.windows(2).all(|w| w[0] <= w[1])
    }
}

/// Equalize a single-channel buffer.
///
/// # Errors
///
/// [`EngineError::InvalidShape`] if `buffer` has more than one channel.
pub fn equalize(buffer: &ImageBuffer) -> EngineResult<ImageBuffer> {
    if !buffer.is_gray() {
        return Err(EngineError::InvalidShape(format!(
            "histogram equalization needs a single channel, got {}",
            buffer.channels()
        )));
    }
    let lut = EqualizationLut::from_samples(buffer.samples())?;
    debug!(
        height = buffer.height(),
        width = buffer.width(),
        "equalizing histogram"
    );
    Ok(buffer.map(|v| lut.apply(narrow_sample(v)) as f32))
}

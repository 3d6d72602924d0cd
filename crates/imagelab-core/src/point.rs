//! Per-sample point operators.
//!
//! These act on each sample independently (apart from the iterative
//! threshold, which first derives its threshold from the whole buffer).

use tracing::{debug, trace};

use crate::buffer::ImageBuffer;
use crate::error::{EngineError, EngineResult};
use crate::scale::rescale_to_255;

/// Threshold changes smaller than this end the iterative search.
pub const THRESHOLD_TOLERANCE: f64 = 0.5;

/// Upper bound on iterative threshold refinements.
pub const MAX_THRESHOLD_ITERATIONS: u32 = 100;

/// Photographic negative: `255 - v`.
pub fn negative(buffer: &ImageBuffer) -> ImageBuffer {
    buffer.map(|v| 255.0 - v)
}

/// Power-law transform `c * v^gamma` with `c = 255^(1 - gamma)`.
///
/// The constant keeps `[0, 255]` mapped onto itself, so 0 and 255 are fixed
/// points for every gamma.
///
/// # Errors
///
/// [`EngineError::InvalidParameter`] unless `gamma` is finite and positive.
pub fn gamma(buffer: &ImageBuffer, gamma: f32) -> EngineResult<ImageBuffer> {
    if !gamma.is_finite() || gamma <= 0.0 {
        return Err(EngineError::InvalidParameter(format!(
            "gamma must be positive, got {}",
            gamma
        )));
    }
    let c = 255.0f32.powf(1.0 - gamma);
    Ok(buffer.map(|v| c * v.max(0.0).powf(gamma)))
}

/// Binary threshold: samples at or above `threshold` become 255, the rest 0.
pub fn threshold(buffer: &ImageBuffer, threshold: f32) -> ImageBuffer {
    buffer.map(|v| if v >= threshold { 255.0 } else { 0.0 })
}

/// Outcome of the iterative threshold search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdEstimate {
    /// Final threshold
    pub threshold: f64,
    /// Refinements performed
    pub iterations: u32,
}

/// Find a threshold separating two intensity populations.
///
/// Starts from the global mean and repeatedly moves the threshold to the
/// midpoint of the means above and at-or-below it, stopping once it moves
/// by less than [`THRESHOLD_TOLERANCE`] or after
/// [`MAX_THRESHOLD_ITERATIONS`] refinements. An empty side contributes the
/// current threshold as its mean.
pub fn estimate_threshold(samples: &[f32]) -> ThresholdEstimate {
    if samples.is_empty() {
        return ThresholdEstimate {
            threshold: 0.0,
            iterations: 0,
        };
    }
    let mut t = samples.iter().map(|&v| v as f64).sum::<f64>() / samples.len() as f64;
    let mut iterations = 0;

    while iterations < MAX_THRESHOLD_ITERATIONS {
        let (mut above_sum, mut above_n, mut below_sum, mut below_n) = (0.0, 0u64, 0.0, 0u64);
        for &v in samples {
            let v = v as f64;
            if v > t {
                above_sum += v;
                above_n += 1;
            } else {
                below_sum += v;
                below_n += 1;
            }
        }
        let above = if above_n > 0 { above_sum / above_n as f64 } else { t };
        let below = if below_n > 0 { below_sum / below_n as f64 } else { t };
        let next = (above + below) / 2.0;
        iterations += 1;
        trace!(iteration = iterations, threshold = next, "refining threshold");

        let delta = (next - t).abs();
        t = next;
        if delta < THRESHOLD_TOLERANCE {
            break;
        }
    }

    ThresholdEstimate {
        threshold: t,
        iterations,
    }
}

/// Threshold a single-channel buffer at its estimated optimal threshold.
///
/// # Errors
///
/// [`EngineError::InvalidShape`] if `buffer` has more than one channel.
pub fn iterative_threshold(buffer: &ImageBuffer) -> EngineResult<(ImageBuffer, ThresholdEstimate)> {
    if !buffer.is_gray() {
        return Err(EngineError::InvalidShape(format!(
            "iterative threshold needs a single channel, got {}",
            buffer.channels()
        )));
    }
    let estimate = estimate_threshold(buffer.samples());
    debug!(
        threshold = estimate.threshold,
        iterations = estimate.iterations,
        "iterative threshold"
    );
    Ok((threshold(buffer, estimate.threshold as f32), estimate))
}

/// Difference `a - b`, rescaled onto `[0, 255]`.
///
/// # Errors
///
/// [`EngineError::SizeMismatch`] if the buffers differ in shape.
pub fn subtract(a: &ImageBuffer, b: &ImageBuffer) -> EngineResult<ImageBuffer> {
    let shape_a = (a.height(), a.width(), a.channels());
    let shape_b = (b.height(), b.width(), b.channels());
    if shape_a != shape_b {
        return Err(EngineError::SizeMismatch(format!(
            "cannot subtract {:?} from {:?}",
            shape_b, shape_a
        )));
    }
    let diff = a
        .samples()
        .iter()
        .zip(b.samples())
        .map(|(x, y)| x - y)
        .collect();
    Ok(rescale_to_255(&a.with_samples(diff)))
}

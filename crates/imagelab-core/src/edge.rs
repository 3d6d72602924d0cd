//! Edge detection: gradient magnitude from a pair of directional kernels,
//! and zero crossings of a second-derivative response.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::buffer::ImageBuffer;
use crate::convolve::convolve_raw;
use crate::error::{EngineError, EngineResult};
use crate::kernel::{laplacian_of_gaussian, make, Kernel, KernelKind};
use crate::scale::rescale_to_255;

/// Second-derivative responses this close to zero have no sign.
pub const ZERO_TOLERANCE: f32 = 1e-3;

/// Classic 3×3 gradient operator pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientOperator {
    #[default]
    Prewitt,
    Sobel,
}

impl GradientOperator {
    /// Horizontal and vertical kernels for this operator.
    pub fn kernels(self) -> EngineResult<(Kernel, Kernel)> {
        let (h, v) = match self {
            GradientOperator::Prewitt => (KernelKind::PrewittH, KernelKind::PrewittV),
            GradientOperator::Sobel => (KernelKind::SobelH, KernelKind::SobelV),
        };
        Ok((make(h, 3)?, make(v, 3)?))
    }
}

/// Combine two directional responses into `sqrt(h² + v²)`, rescaled to bytes.
///
/// Both convolutions run unnormalized so the signed responses are squared
/// before any range policy applies. The result does not depend on argument
/// order.
///
/// # Errors
///
/// [`EngineError::InvalidKernelSize`] if the kernels differ in size.
pub fn gradient_magnitude(
    buffer: &ImageBuffer,
    horizontal: &Kernel,
    vertical: &Kernel,
) -> EngineResult<ImageBuffer> {
    if horizontal.size() != vertical.size() {
        return Err(EngineError::InvalidKernelSize {
            size: vertical.size(),
        });
    }
    trace!(size = horizontal.size(), "gradient magnitude");

    let gh = convolve_raw(buffer, horizontal);
    let gv = convolve_raw(buffer, vertical);
    let magnitude = gh
        .samples()
        .iter()
        .zip(gv.samples())
        .map(|(&h, &v)| (h * h + v * v).sqrt())
        .collect();

    Ok(rescale_to_255(&buffer.with_samples(magnitude)))
}

/// Edge map from the sign changes of a second-derivative response.
///
/// A sample becomes 255 when its right or lower neighbour has the opposite
/// sign and the two differ by more than `threshold`; every other sample is
/// 0. A neighbour within [`ZERO_TOLERANCE`] of zero is stepped over once, so
/// `-a, 0, +b` still counts as a crossing at the first sample. Channels are
/// handled independently.
///
/// # Errors
///
/// [`EngineError::InvalidParameter`] unless `threshold` is finite and
/// non-negative.
pub fn zero_crossings(response: &ImageBuffer, threshold: f32) -> EngineResult<ImageBuffer> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(EngineError::InvalidParameter(format!(
            "zero crossing threshold must be non-negative, got {}",
            threshold
        )));
    }
    let (height, width, channels) = (response.height(), response.width(), response.channels());
    let samples = response.samples();
    let at = |x: usize, y: usize, c: usize| samples[(y * width + x) * channels + c];

    let mut out = vec![0.0f32; samples.len()];
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let p = at(x, y, c);
                if p.abs() <= ZERO_TOLERANCE {
                    continue;
                }
                let right = (x + 1 < width).then(|| at(x + 1, y, c));
                let right2 = (x + 2 < width).then(|| at(x + 2, y, c));
                let below = (y + 1 < height).then(|| at(x, y + 1, c));
                let below2 = (y + 2 < height).then(|| at(x, y + 2, c));
                if crosses(p, right, right2, threshold) || crosses(p, below, below2, threshold) {
                    out[(y * width + x) * channels + c] = 255.0;
                }
            }
        }
    }
    trace!(
        edges = out.iter().filter(|&&v| v > 0.0).count(),
        "zero crossings"
    );

    Ok(response.with_samples(out))
}

fn crosses(p: f32, next: Option<f32>, after: Option<f32>, threshold: f32) -> bool {
    let q = match next {
        Some(q) if q.abs() <= ZERO_TOLERANCE => after,
        other => other,
    };
    match q {
        Some(q) => q.abs() > ZERO_TOLERANCE && (p > 0.0) != (q > 0.0) && (p - q).abs() > threshold,
        None => false,
    }
}

/// Laplacian method: zero crossings of the 4-neighbour Laplacian.
pub fn laplacian_edges(buffer: &ImageBuffer, threshold: f32) -> EngineResult<ImageBuffer> {
    let kernel = make(KernelKind::Laplacian, 3)?;
    zero_crossings(&convolve_raw(buffer, &kernel), threshold)
}

/// Marr-Hildreth: zero crossings of a Laplacian of Gaussian with `sigma`.
///
/// # Errors
///
/// As [`laplacian_of_gaussian`] and [`zero_crossings`].
pub fn log_edges(buffer: &ImageBuffer, sigma: f64, threshold: f32) -> EngineResult<ImageBuffer> {
    let kernel = laplacian_of_gaussian(sigma)?;
    trace!(sigma, size = kernel.size(), "LoG edges");
    zero_crossings(&convolve_raw(buffer, &kernel), threshold)
}

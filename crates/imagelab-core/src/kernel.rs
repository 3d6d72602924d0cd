//! Kernel construction for every filter family the engine supports.
//!
//! A [`Kernel`] is a square array of weights with an odd side length plus a
//! scalar factor that is multiplied into the weighted sum. Keeping the
//! factor separate lets integer-valued kernels (mean, Prewitt, Sobel) stay
//! exact while the normalization is applied once per output sample.
//!
//! # Families
//!
//! | Kind | Parameter | Factor |
//! |------|-----------|--------|
//! | `Mean` | side `k` | `1/k²` |
//! | `Gaussian` | sigma, side `2σ+1` | `1/Σw` |
//! | `Realce` | side `k` | `1` |
//! | `PrewittH`, `PrewittV`, `SobelH`, `SobelV`, `Laplacian` | ignored (3×3) | `1` |
//! | `LaplacianOfGaussian` | sigma, side `2⌈3σ⌉+1` | `1` |
//!
//! Weighted-median repetition counts are built with [`RankWeights`].

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Largest accepted side length. Convolution cost grows with its square.
pub const MAX_KERNEL_SIZE: usize = 4095;

/// Scale applied to gaussian weights before truncating them to counts.
pub const WEIGHTED_MEDIAN_SCALE: f64 = 50.0;

/// Filter family selector consumed by [`make`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelKind {
    /// Box average.
    Mean,
    /// Gaussian blur; the parameter is sigma.
    Gaussian,
    /// High-pass edge enhancement.
    Realce,
    /// Prewitt horizontal derivative.
    PrewittH,
    /// Prewitt vertical derivative.
    PrewittV,
    /// Sobel horizontal derivative.
    SobelH,
    /// Sobel vertical derivative.
    SobelV,
    /// 4-neighbour Laplacian.
    Laplacian,
    /// Gaussian-derived weights for the weighted median, as a real kernel.
    WeightedMedianWeights,
    /// Marr-Hildreth operator; the parameter is sigma.
    LaplacianOfGaussian,
}

/// A square convolution kernel with a normalization factor.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    size: usize,
    weights: Vec<f32>,
    factor: f32,
}

impl Kernel {
    /// Create a kernel from row-major weights.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidKernelSize`] if `size` is even, zero or above
    /// [`MAX_KERNEL_SIZE`], and [`EngineError::InvalidParameter`] if
    /// `weights.len() != size * size`.
    pub fn new(size: usize, weights: Vec<f32>, factor: f32) -> EngineResult<Self> {
        if weights.len() != kernel_area(size)? {
            return Err(EngineError::InvalidParameter(format!(
                "kernel data size {} doesn't match {}x{}",
                weights.len(),
                size,
                size
            )));
        }
        Ok(Self {
            size,
            weights,
            factor,
        })
    }

    /// The `size`×`size` kernel that reproduces its input.
    pub fn identity(size: usize) -> EngineResult<Self> {
        let mut weights = vec![0.0; kernel_area(size)?];
        weights[(size / 2) * size + size / 2] = 1.0;
        Ok(Self {
            size,
            weights,
            factor: 1.0,
        })
    }

    /// Side length.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Half side length, i.e. the zero padding needed on each border.
    #[inline]
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    /// Row-major weights, before the factor is applied.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Multiplier applied after the weighted sum.
    #[inline]
    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Weight at column `x`, row `y`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.weights[y * self.size + x]
    }

    /// Sum of the raw weights.
    pub fn sum(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// Weights with the factor folded in.
    pub fn scaled_weights(&self) -> Vec<f32> {
        self.weights.iter().map(|w| w * self.factor).collect()
    }
}

/// Repetition counts for the weighted median.
///
/// Each cell says how many times the matching neighbourhood sample is
/// repeated in the multiset whose median becomes the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankWeights {
    size: usize,
    counts: Vec<u32>,
}

impl RankWeights {
    /// Create weights from row-major counts.
    pub fn new(size: usize, counts: Vec<u32>) -> EngineResult<Self> {
        if counts.len() != kernel_area(size)? {
            return Err(EngineError::InvalidParameter(format!(
                "rank weight size {} doesn't match {}x{}",
                counts.len(),
                size,
                size
            )));
        }
        if counts.iter().all(|&c| c == 0) {
            return Err(EngineError::InvalidParameter(
                "rank weights must contain at least one non-zero count".into(),
            ));
        }
        Ok(Self { size, counts })
    }

    /// All-ones weights: an ordinary median.
    pub fn uniform(size: usize) -> EngineResult<Self> {
        Ok(Self {
            size,
            counts: vec![1; kernel_area(size)?],
        })
    }

    /// Gaussian-derived weights for a weighted median of side `size`.
    ///
    /// Uses sigma `(size - 1) / 2` so that `size = 2σ + 1`, multiplies the
    /// gaussian density by [`WEIGHTED_MEDIAN_SCALE`] and truncates. The
    /// centre count is kept at 1 or more so the multiset is never empty.
    ///
    /// Only sides 3 and 5 produce real neighbourhood weights. From side 7
    /// on the scaled density peaks below 1 (`50/(18π) ≈ 0.88` at the centre
    /// for side 7), every count truncates to 0 and only the forced centre
    /// survives, so the weighted median returns its input unchanged.
    pub fn gaussian(size: usize) -> EngineResult<Self> {
        kernel_area(size)?;
        if size == 1 {
            return Ok(Self {
                size,
                counts: vec![1],
            });
        }
        let sigma = ((size - 1) / 2) as f64;
        let mut counts: Vec<u32> = gaussian_density(size, sigma)
            .into_iter()
            .map(|w| (w * WEIGHTED_MEDIAN_SCALE) as u32)
            .collect();
        let center = (size / 2) * size + size / 2;
        counts[center] = counts[center].max(1);
        Ok(Self { size, counts })
    }

    /// Side length.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Half side length.
    #[inline]
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    /// Row-major counts.
    #[inline]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Size of the multiset a full neighbourhood expands to.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }
}

/// Build the kernel for `kind`.
///
/// `param` is the side length for `Mean`, `Realce` and
/// `WeightedMedianWeights`, sigma for `Gaussian` and `LaplacianOfGaussian`,
/// and is ignored for the fixed 3×3 operators.
///
/// # Errors
///
/// [`EngineError::InvalidKernelSize`] when a side length is even, zero or
/// too large, and [`EngineError::InvalidParameter`] for a zero LoG sigma.
pub fn make(kind: KernelKind, param: usize) -> EngineResult<Kernel> {
    match kind {
        KernelKind::Mean => mean(param),
        KernelKind::Gaussian => gaussian(param),
        KernelKind::Realce => realce(param),
        KernelKind::PrewittH => Ok(fixed3(PREWITT_H)),
        KernelKind::PrewittV => Ok(fixed3(PREWITT_V)),
        KernelKind::SobelH => Ok(fixed3(SOBEL_H)),
        KernelKind::SobelV => Ok(fixed3(SOBEL_V)),
        KernelKind::Laplacian => Ok(fixed3(LAPLACIAN)),
        KernelKind::WeightedMedianWeights => {
            let weights = RankWeights::gaussian(param)?;
            Ok(Kernel {
                size: weights.size,
                weights: weights.counts.iter().map(|&c| c as f32).collect(),
                factor: 1.0,
            })
        }
        KernelKind::LaplacianOfGaussian => laplacian_of_gaussian(param as f64),
    }
}

/// Laplacian of Gaussian for a real `sigma`.
///
/// Samples `-(2 - r²/σ²) · exp(-r²/2σ²) / (√(2π) σ³)` on a side of
/// `2⌈3σ⌉ + 1` cells and then subtracts the mean weight, so the kernel sums
/// to zero and flat regions have no response. The centre is negative.
///
/// # Errors
///
/// [`EngineError::InvalidParameter`] unless `sigma` is finite and positive,
/// [`EngineError::InvalidKernelSize`] if the side would exceed
/// [`MAX_KERNEL_SIZE`].
pub fn laplacian_of_gaussian(sigma: f64) -> EngineResult<Kernel> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(EngineError::InvalidParameter(format!(
            "LoG sigma must be positive, got {}",
            sigma
        )));
    }
    // float to int casts saturate, and validation rejects the saturated side
    let size = (2.0 * (3.0 * sigma).ceil() + 1.0) as usize;
    let area = kernel_area(size)?;

    let c = (size / 2) as f64;
    let sigma2 = sigma * sigma;
    let norm = -1.0 / ((2.0 * std::f64::consts::PI).sqrt() * sigma2 * sigma);
    let mut weights = Vec::with_capacity(area);
    for y in 0..size {
        for x in 0..size {
            let dx = x as f64 - c;
            let dy = y as f64 - c;
            let r2 = dx * dx + dy * dy;
            weights.push(norm * (2.0 - r2 / sigma2) * (-r2 / (2.0 * sigma2)).exp());
        }
    }
    let mean = weights.iter().sum::<f64>() / area as f64;
    Ok(Kernel {
        size,
        weights: weights.into_iter().map(|w| (w - mean) as f32).collect(),
        factor: 1.0,
    })
}

fn mean(size: usize) -> EngineResult<Kernel> {
    let area = kernel_area(size)?;
    Ok(Kernel {
        size,
        weights: vec![1.0; area],
        factor: 1.0 / area as f32,
    })
}

fn gaussian(sigma: usize) -> EngineResult<Kernel> {
    if sigma == 0 {
        return Kernel::identity(1);
    }
    // saturates to an odd side that validation rejects
    let size = sigma.saturating_mul(2).saturating_add(1);
    kernel_area(size)?;
    let weights: Vec<f32> = gaussian_density(size, sigma as f64)
        .into_iter()
        .map(|w| w as f32)
        .collect();
    let sum: f32 = weights.iter().sum();
    Ok(Kernel {
        size,
        weights,
        factor: 1.0 / sum,
    })
}

fn realce(size: usize) -> EngineResult<Kernel> {
    let area = kernel_area(size)?;
    let mut weights = vec![-1.0; area];
    weights[(size / 2) * size + size / 2] = (area - 1) as f32;
    Ok(Kernel {
        size,
        weights,
        factor: 1.0,
    })
}

/// Unnormalized 2D gaussian density sampled on a `size`×`size` grid
/// centred on the middle cell.
fn gaussian_density(size: usize, sigma: f64) -> Vec<f64> {
    let c = (size / 2) as f64;
    let two_sigma2 = 2.0 * sigma * sigma;
    let norm = 1.0 / (std::f64::consts::PI * two_sigma2);
    let mut out = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let dx = x as f64 - c;
            let dy = y as f64 - c;
            out.push(norm * (-(dx * dx + dy * dy) / two_sigma2).exp());
        }
    }
    out
}

#[rustfmt::skip]
const PREWITT_H: [f32; 9] = [
    -1.0, 0.0, 1.0,
    -1.0, 0.0, 1.0,
    -1.0, 0.0, 1.0,
];

#[rustfmt::skip]
const PREWITT_V: [f32; 9] = [
    -1.0, -1.0, -1.0,
     0.0,  0.0,  0.0,
     1.0,  1.0,  1.0,
];

#[rustfmt::skip]
const SOBEL_H: [f32; 9] = [
    -1.0, 0.0, 1.0,
    -2.0, 0.0, 2.0,
    -1.0, 0.0, 1.0,
];

#[rustfmt::skip]
const SOBEL_V: [f32; 9] = [
    -1.0, -2.0, -1.0,
     0.0,  0.0,  0.0,
     1.0,  2.0,  1.0,
];

#[rustfmt::skip]
const LAPLACIAN: [f32; 9] = [
     0.0, -1.0,  0.0,
    -1.0,  4.0, -1.0,
     0.0, -1.0,  0.0,
];

fn fixed3(weights: [f32; 9]) -> Kernel {
    Kernel {
        size: 3,
        weights: weights.to_vec(),
        factor: 1.0,
    }
}

/// Reject even, zero and oversized side lengths.
pub fn validate_kernel_size(size: usize) -> EngineResult<()> {
    if size == 0 || size % 2 == 0 || size > MAX_KERNEL_SIZE {
        return Err(EngineError::InvalidKernelSize { size });
    }
    Ok(())
}

/// Cell count of a `size`×`size` kernel, after validating `size`.
pub(crate) fn kernel_area(size: usize) -> EngineResult<usize> {
    validate_kernel_size(size)?;
    size.checked_mul(size)
        .ok_or(EngineError::InvalidKernelSize { size })
}

//! Single entry point that dispatches every engine operation.
//!
//! An [`Operation`] is a plain serde record, so a UI can describe what to do
//! as data and hand it over together with the image. [`transform`] optionally
//! reduces the image to gray, runs the operation and returns a buffer of
//! whole byte levels.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bilateral::bilateral;
use crate::buffer::ImageBuffer;
use crate::convolve::{convolve, OutputMode};
use crate::diffusion::{diffuse, DiffusionSpec};
use crate::edge::{gradient_magnitude, laplacian_edges, log_edges, GradientOperator};
use crate::error::EngineResult;
use crate::histogram::equalize;
use crate::kernel::{make, KernelKind, RankWeights};
use crate::noise::{apply_noise, NoiseSpec};
use crate::point;
use crate::rank::rank_filter;
use crate::scale::clip_to_255;

/// One engine operation and its parameters.
///
/// Serialized with an `op` tag, e.g. `{"op": "median", "size": 3}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Negative,
    Gamma {
        gamma: f32,
    },
    Threshold {
        threshold: f32,
    },
    IterativeThreshold,
    Equalize,
    /// Convolution with a kernel from the factory
    Filter {
        kind: KernelKind,
        /// Side length, or sigma for gaussian kernels
        size: usize,
        #[serde(default)]
        mode: OutputMode,
    },
    Median {
        size: usize,
    },
    WeightedMedian {
        size: usize,
    },
    Gradient {
        #[serde(default)]
        operator: GradientOperator,
    },
    Noise(NoiseSpec),
    /// Isotropic or Perona-Malik diffusion
    Diffusion(DiffusionSpec),
    Bilateral {
        size: usize,
        sigma_spatial: f32,
        sigma_range: f32,
    },
    /// Zero crossings of the 4-neighbour Laplacian
    LaplacianEdges {
        #[serde(default)]
        threshold: f32,
    },
    /// Marr-Hildreth: zero crossings of a Laplacian of Gaussian
    LogEdges {
        sigma: f64,
        #[serde(default)]
        threshold: f32,
    },
}

impl Operation {
    /// Whether the operation only makes sense on a single channel.
    pub fn requires_gray(&self) -> bool {
        matches!(self, Operation::Equalize | Operation::IterativeThreshold)
    }
}

/// Run `operation` on `buffer`, drawing any randomness from the thread RNG.
///
/// # Arguments
/// * `buffer` - Gray or RGB input
/// * `gray_mode` - Reduce the input to one channel first
/// * `operation` - What to do
pub fn transform(buffer: &ImageBuffer, gray_mode: bool, operation: &Operation) -> EngineResult<ImageBuffer> {
    transform_with_rng(buffer, gray_mode, operation, &mut rand::thread_rng())
}

/// Run `operation` on `buffer` with an explicit random source.
///
/// Operations that need a single channel reduce RGB input to gray even when
/// `gray_mode` is off. The result is always clamped and truncated to whole
/// byte levels.
pub fn transform_with_rng<R: Rng + ?Sized>(
    buffer: &ImageBuffer,
    gray_mode: bool,
    operation: &Operation,
    rng: &mut R,
) -> EngineResult<ImageBuffer> {
    debug!(
        height = buffer.height(),
        width = buffer.width(),
        channels = buffer.channels(),
        gray_mode,
        ?operation,
        "transform"
    );

    let reduced;
    let input = if (gray_mode || operation.requires_gray()) && !buffer.is_gray() {
        reduced = buffer.to_gray();
        &reduced
    } else {
        buffer
    };

    let output = match *operation {
        Operation::Negative => point::negative(input),
        Operation::Gamma { gamma } => point::gamma(input, gamma)?,
        Operation::Threshold { threshold } => point::threshold(input, threshold),
        Operation::IterativeThreshold => point::iterative_threshold(input)?.0,
        Operation::Equalize => equalize(input)?,
        Operation::Filter { kind, size, mode } => convolve(input, &make(kind, size)?, mode),
        Operation::Median { size } => rank_filter(input, &RankWeights::uniform(size)?),
        Operation::WeightedMedian { size } => rank_filter(input, &RankWeights::gaussian(size)?),
        Operation::Gradient { operator } => {
            let (kh, kv) = operator.kernels()?;
            gradient_magnitude(input, &kh, &kv)?
        }
        Operation::Noise(ref spec) => apply_noise(input, spec, rng)?,
        Operation::Diffusion(ref spec) => diffuse(input, spec)?,
        Operation::Bilateral {
            size,
            sigma_spatial,
            sigma_range,
        } => bilateral(input, size, sigma_spatial, sigma_range)?,
        Operation::LaplacianEdges { threshold } => laplacian_edges(input, threshold)?,
        Operation::LogEdges { sigma, threshold } => log_edges(input, sigma, threshold)?,
    };

    Ok(clip_to_255(&output))
}

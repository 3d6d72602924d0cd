//! Imagelab Core - Image transform engine
//!
//! This crate provides the numeric side of the Imagelab editor over gray or
//! RGB sample buffers: kernel convolution, median, diffusion and bilateral
//! smoothing, gradient and zero-crossing edge detection, noise injection,
//! histogram equalization and point operators.

pub mod analysis;
pub mod bilateral;
pub mod buffer;
pub mod convolve;
pub mod diffusion;
pub mod edge;
pub mod engine;
pub mod error;
pub mod histogram;
pub mod kernel;
pub mod luminance;
pub mod noise;
pub mod point;
pub mod rank;
pub mod scale;

pub use analysis::{region_stats, RegionStats};
pub use bilateral::bilateral;
pub use buffer::ImageBuffer;
pub use convolve::{convolve, OutputMode};
pub use diffusion::{diffuse, DiffusionMode, DiffusionSpec, EdgeStopping};
pub use edge::{gradient_magnitude, laplacian_edges, log_edges, zero_crossings, GradientOperator};
pub use engine::{transform, transform_with_rng, Operation};
pub use error::{EngineError, EngineResult};
pub use histogram::{compute_histogram, equalize, EqualizationLut};
pub use kernel::{laplacian_of_gaussian, make, Kernel, KernelKind, RankWeights};
pub use noise::{apply_noise, NoiseKind, NoiseMode, NoiseSpec};
pub use rank::rank_filter;
pub use scale::{clip_to_255, rescale_to_255};

/// Histogram data for an image
#[derive(Debug, Clone)]
pub struct Histogram {
    /// Red channel histogram (256 bins)
    pub red: [u32; 256],
    /// Green channel histogram (256 bins)
    pub green: [u32; 256],
    /// Blue channel histogram (256 bins)
    pub blue: [u32; 256],
    /// Gray level histogram (256 bins)
    pub gray: [u32; 256],
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            red: [0; 256],
            green: [0; 256],
            blue: [0; 256],
            gray: [0; 256],
        }
    }
}

impl Histogram {
    /// Create a new empty histogram
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the maximum count across all four histograms for normalization
    pub fn max_value(&self) -> u32 {
        let max_r = *self.red.iter().max().unwrap_or(&0);
        let max_g = *self.green.iter().max().unwrap_or(&0);
        let max_b = *self.blue.iter().max().unwrap_or(&0);
        let max_gray = *self.gray.iter().max().unwrap_or(&0);
        max_r.max(max_g).max(max_b).max(max_gray)
    }
}

//! Stochastic noise injection.
//!
//! Distribution noise perturbs a fixed-size random subset of pixels and then
//! rescales the buffer, since the perturbed samples are unbounded. Impulse
//! (salt and pepper) noise instead overwrites pixels with black or white and
//! leaves every other sample untouched.
//!
//! The random source is always supplied by the caller so results can be
//! reproduced with a seeded generator.

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::buffer::ImageBuffer;
use crate::error::{EngineError, EngineResult};
use crate::scale::rescale_to_255;

/// Noise distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    /// Zero-mean gaussian with standard deviation `scale`.
    #[default]
    Normal,
    /// Rayleigh with mode `scale`.
    Rayleigh,
    /// Exponential with mean `scale`.
    Exponential,
    /// Salt and pepper; `scale` is unused.
    Impulse,
}

/// How a drawn noise value combines with the pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseMode {
    #[default]
    Additive,
    Multiplicative,
}

/// Parameters for [`apply_noise`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSpec {
    pub kind: NoiseKind,
    /// Distribution scale (sigma, xi or beta)
    pub scale: f64,
    /// Percentage of pixels to contaminate (0 to 100)
    pub contamination: f64,
    pub mode: NoiseMode,
}

impl Default for NoiseSpec {
    fn default() -> Self {
        Self {
            kind: NoiseKind::Normal,
            scale: 20.0,
            contamination: 10.0,
            mode: NoiseMode::Additive,
        }
    }
}

impl NoiseSpec {
    /// Probability of each of the two impulse extremes.
    ///
    /// Salt and pepper together cover `contamination` percent of pixels.
    pub fn impulse_probability(&self) -> f64 {
        self.contamination / 2.0 / 100.0
    }
}

/// Apply `spec` to `buffer` using `rng`.
///
/// # Errors
///
/// - [`EngineError::InvalidParameter`] for a negative or NaN contamination
///   or scale.
/// - [`EngineError::SampleExhaustion`] when the contamination asks for more
///   pixels than the buffer has.
pub fn apply_noise<R: Rng + ?Sized>(
    buffer: &ImageBuffer,
    spec: &NoiseSpec,
    rng: &mut R,
) -> EngineResult<ImageBuffer> {
    if spec.scale.is_nan() || spec.scale < 0.0 {
        return Err(EngineError::InvalidParameter(format!(
            "noise scale must be non-negative, got {}",
            spec.scale
        )));
    }
    let count = contamination_count(buffer.pixel_count(), spec.contamination)?;
    debug!(
        kind = ?spec.kind,
        mode = ?spec.mode,
        scale = spec.scale,
        contamination = spec.contamination,
        count,
        "applying noise"
    );

    match spec.kind {
        NoiseKind::Impulse => Ok(apply_impulse(buffer, spec.impulse_probability(), rng)),
        kind => {
            let indices = select_noise_indices(buffer.pixel_count(), spec.contamination, rng)?;
            let draws = sample_distribution(kind, spec.scale, indices.len(), rng)?;

            let channels = buffer.channels();
            let mut data = buffer.samples().to_vec();
            for (&idx, &n) in indices.iter().zip(&draws) {
                let n = n as f32;
                for v in &mut data[idx * channels..(idx + 1) * channels] {
                    match spec.mode {
                        NoiseMode::Additive => *v += n,
                        NoiseMode::Multiplicative => *v *= n,
                    }
                }
            }
            Ok(rescale_to_255(&buffer.with_samples(data)))
        }
    }
}

/// Choose `floor(contamination / 100 * pixel_count)` distinct flat pixel
/// indices uniformly at random.
pub fn select_noise_indices<R: Rng + ?Sized>(
    pixel_count: usize,
    contamination: f64,
    rng: &mut R,
) -> EngineResult<Vec<usize>> {
    let count = contamination_count(pixel_count, contamination)?;
    trace!(pixel_count, count, "sampling noise indices");
    Ok(index::sample(rng, pixel_count, count).into_vec())
}

/// Draw `count` values from `kind` with the given scale.
///
/// Normal draws use the Box-Muller transform; Rayleigh and exponential use
/// their inverse CDFs. Impulse has no continuous distribution and yields an
/// error.
pub fn sample_distribution<R: Rng + ?Sized>(
    kind: NoiseKind,
    scale: f64,
    count: usize,
    rng: &mut R,
) -> EngineResult<Vec<f64>> {
    if scale.is_nan() || scale < 0.0 {
        return Err(EngineError::InvalidParameter(format!(
            "distribution scale must be non-negative, got {}",
            scale
        )));
    }
    let draw: fn(&mut R, f64) -> f64 = match kind {
        NoiseKind::Normal => |rng, s| s * standard_normal(rng),
        NoiseKind::Rayleigh => |rng, s| s * (-2.0 * open_unit(rng).ln()).sqrt(),
        NoiseKind::Exponential => |rng, s| -s * open_unit(rng).ln(),
        NoiseKind::Impulse => {
            return Err(EngineError::InvalidParameter(
                "impulse noise has no sampling distribution".into(),
            ))
        }
    };
    Ok((0..count).map(|_| draw(rng, scale)).collect())
}

fn apply_impulse<R: Rng + ?Sized>(buffer: &ImageBuffer, p: f64, rng: &mut R) -> ImageBuffer {
    let channels = buffer.channels();
    let mut data = buffer.samples().to_vec();
    for px in data.chunks_exact_mut(channels) {
        let u: f64 = rng.gen();
        if u <= p {
            px.fill(0.0);
        } else if u > 1.0 - p {
            px.fill(255.0);
        }
    }
    buffer.with_samples(data)
}

fn contamination_count(pixel_count: usize, contamination: f64) -> EngineResult<usize> {
    if contamination.is_nan() || contamination < 0.0 {
        return Err(EngineError::InvalidParameter(format!(
            "contamination must be non-negative, got {}",
            contamination
        )));
    }
    // multiply first: 29.0 / 100.0 * 100.0 lands just below 29
    let requested = (contamination * pixel_count as f64 / 100.0).floor();
    if requested > pixel_count as f64 {
        return Err(EngineError::SampleExhaustion {
            requested: requested as usize,
            available: pixel_count,
        });
    }
    Ok(requested as usize)
}

/// Uniform sample in `(0, 1]`, safe to take the logarithm of.
#[inline]
fn open_unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    1.0 - rng.gen::<f64>()
}

#[inline]
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1 = open_unit(rng);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

//! Edge-preserving bilateral smoothing.
//!
//! Every output pixel is a weighted mean of its `size`×`size` neighbourhood.
//! A neighbour's weight is the product of a spatial gaussian on its offset
//! and a range gaussian on its colour distance to the centre pixel, so
//! samples across a strong edge contribute almost nothing.

use tracing::debug;

use crate::buffer::ImageBuffer;
use crate::error::{EngineError, EngineResult};
use crate::kernel::kernel_area;

/// Apply a bilateral filter to `buffer`.
///
/// The range distance is Euclidean over all channels, so the three channels
/// of an RGB pixel share one weight and hue is kept. Neighbours outside the
/// image are left out of the mean rather than read as zero.
///
/// # Arguments
/// * `size` - Odd window side length
/// * `sigma_spatial` - Spread of the offset weight, in pixels
/// * `sigma_range` - Spread of the colour weight, in gray levels
///
/// # Errors
///
/// [`EngineError::InvalidKernelSize`] for an invalid window and
/// [`EngineError::InvalidParameter`] unless both sigmas are finite and
/// positive.
pub fn bilateral(
    buffer: &ImageBuffer,
    size: usize,
    sigma_spatial: f32,
    sigma_range: f32,
) -> EngineResult<ImageBuffer> {
    let area = kernel_area(size)?;
    for (name, sigma) in [("spatial", sigma_spatial), ("range", sigma_range)] {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "bilateral {} sigma must be positive, got {}",
                name, sigma
            )));
        }
    }
    let (height, width, channels) = (buffer.height(), buffer.width(), buffer.channels());
    let r = size / 2;
    debug!(height, width, channels, size, sigma_spatial, sigma_range, "bilateral filtering");

    let spatial_coeff = -0.5 / (sigma_spatial * sigma_spatial);
    let range_coeff = -0.5 / (sigma_range * sigma_range);
    let mut spatial = Vec::with_capacity(area);
    for ky in 0..size {
        for kx in 0..size {
            let dy = ky as f32 - r as f32;
            let dx = kx as f32 - r as f32;
            spatial.push((spatial_coeff * (dx * dx + dy * dy)).exp());
        }
    }

    let src = buffer.samples();
    let mut out = vec![0.0f32; src.len()];
    let mut acc = vec![0.0f32; channels];
    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) * channels;
            let centre = &src[idx..idx + channels];
            acc.fill(0.0);
            let mut total = 0.0f32;

            let ys = y.saturating_sub(r)..(y + r + 1).min(height);
            for ny in ys {
                let xs = x.saturating_sub(r)..(x + r + 1).min(width);
                for nx in xs {
                    let nidx = (ny * width + nx) * channels;
                    let neighbour = &src[nidx..nidx + channels];
                    let distance: f32 = centre
                        .iter()
                        .zip(neighbour)
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum();
                    let w = spatial[(ny + r - y) * size + (nx + r - x)] * (range_coeff * distance).exp();
                    for (a, &v) in acc.iter_mut().zip(neighbour) {
                        *a += w * v;
                    }
                    total += w;
                }
            }

            // the centre always contributes weight 1
            for (o, a) in out[idx..idx + channels].iter_mut().zip(&acc) {
                *o = a / total;
            }
        }
    }

    Ok(buffer.with_samples(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_image() -> ImageBuffer {
        let data = (0..64).map(|i| if i % 8 >= 4 { 200.0 } else { 0.0 }).collect();
        ImageBuffer::new(8, 8, 1, data).unwrap()
    }

    #[test]
    fn test_size_one_is_identity() {
        let data: Vec<f32> = (0..27).map(|v| (v * 11 % 256) as f32).collect();
        let buf = ImageBuffer::new(3, 3, 3, data).unwrap();
        assert_eq!(bilateral(&buf, 1, 2.0, 20.0).unwrap(), buf);
    }

    #[test]
    fn test_flat_image_unchanged() {
        let buf = ImageBuffer::filled(6, 6, 1, 140.0).unwrap();
        let out = bilateral(&buf, 5, 2.0, 25.0).unwrap();
        for &v in out.samples() {
            assert!((v - 140.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_preserves_step_edge() {
        let buf = step_image();
        let out = bilateral(&buf, 5, 3.0, 10.0).unwrap();
        // exp(-200² / 200) is zero in f32
        assert_eq!(out.get(3, 4, 0), 0.0);
        assert!((out.get(4, 4, 0) - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_wide_range_sigma_blurs_like_a_gaussian() {
        let buf = step_image();
        let out = bilateral(&buf, 3, 1.0, 1e6).unwrap();
        let edge = out.get(3, 4, 0);
        assert!(edge > 30.0 && edge < 100.0, "edge {}", edge);
    }

    #[test]
    fn test_smooths_low_contrast_texture() {
        let data: Vec<f32> = (0..36).map(|i| if (i / 6 + i % 6) % 2 == 0 { 100.0 } else { 106.0 }).collect();
        let buf = ImageBuffer::new(6, 6, 1, data).unwrap();
        let out = bilateral(&buf, 3, 1.0, 50.0).unwrap();
        let (lo, hi) = out.min_max();
        assert!(hi - lo < 6.0);
        assert!(lo >= 100.0 && hi <= 106.0);
    }

    #[test]
    fn test_rgb_channels_share_weights() {
        // two pixels far apart in red only: green and blue stay put
        let buf = ImageBuffer::new(1, 2, 3, vec![0.0, 50.0, 50.0, 255.0, 50.0, 50.0]).unwrap();
        let out = bilateral(&buf, 3, 1.0, 5.0).unwrap();
        assert_eq!(out.get(0, 0, 0), 0.0);
        assert_eq!(out.get(1, 0, 0), 255.0);
        assert_eq!(out.get(0, 0, 1), 50.0);
    }

    #[test]
    fn test_invalid_parameters() {
        let buf = step_image();
        assert_eq!(
            bilateral(&buf, 4, 1.0, 1.0).unwrap_err(),
            EngineError::InvalidKernelSize { size: 4 }
        );
        for (s, r) in [(0.0, 1.0), (1.0, -1.0), (f32::NAN, 1.0), (1.0, f32::INFINITY)] {
            assert!(matches!(
                bilateral(&buf, 3, s, r),
                Err(EngineError::InvalidParameter(_))
            ));
        }
    }
}

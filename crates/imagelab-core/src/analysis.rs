//! Rectangular region statistics.

use serde::Serialize;

use crate::buffer::{narrow_sample, ImageBuffer};
use crate::error::{EngineError, EngineResult};
use crate::luminance::gray_level_truncated;

/// Summary of the pixels inside a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegionStats {
    pub pixel_count: usize,
    pub mean_red: u32,
    pub mean_green: u32,
    pub mean_blue: u32,
    /// Gray level of the (truncated) channel means
    pub mean_gray: u32,
}

/// Compute statistics for the half-open rectangle `[x0, x1) × [y0, y1)`.
///
/// Corners may be given in any order and are clamped to the image. Gray
/// buffers report their single channel as red, green and blue.
///
/// # Errors
///
/// [`EngineError::InvalidParameter`] if the clamped region is empty.
pub fn region_stats(
    buffer: &ImageBuffer,
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
) -> EngineResult<RegionStats> {
    let (left, right) = (x0.min(x1), x0.max(x1).min(buffer.width()));
    let (top, bottom) = (y0.min(y1), y0.max(y1).min(buffer.height()));
    if left >= right || top >= bottom {
        return Err(EngineError::InvalidParameter(format!(
            "region ({}, {})-({}, {}) contains no pixels",
            x0, y0, x1, y1
        )));
    }

    let channels = buffer.channels();
    let mut sums = [0u64; 3];
    for y in top..bottom {
        for x in left..right {
            for (c, sum) in sums.iter_mut().enumerate() {
                let channel = if channels == 1 { 0 } else { c };
                *sum += narrow_sample(buffer.get(x, y, channel)) as u64;
            }
        }
    }

    let pixel_count = (right - left) * (bottom - top);
    let n = pixel_count as u64;
    let [mean_red, mean_green, mean_blue] = sums.map(|s| (s / n) as u32);

    Ok(RegionStats {
        pixel_count,
        mean_red,
        mean_green,
        mean_blue,
        mean_gray: gray_level_truncated(mean_red, mean_green, mean_blue),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_means() {
        // 2x2 region of an RGB image
        let buf = ImageBuffer::from_u8(
            2,
            3,
            3,
            &[
                100, 150, 200, 101, 151, 201, 0, 0, 0, //
                100, 150, 200, 102, 150, 200, 0, 0, 0,
            ],
        )
        .unwrap();
        let stats = region_stats(&buf, 0, 0, 2, 2).unwrap();
        assert_eq!(stats.pixel_count, 4);
        // 403 / 4, 601 / 4, 801 / 4 truncated
        assert_eq!(stats.mean_red, 100);
        assert_eq!(stats.mean_green, 150);
        assert_eq!(stats.mean_blue, 200);
        assert_eq!(stats.mean_gray, 140);
    }

    #[test]
    fn test_region_clamped_and_reordered() {
        let buf = ImageBuffer::filled(4, 4, 1, 60.0).unwrap();
        let stats = region_stats(&buf, 10, 10, 2, 2).unwrap();
        assert_eq!(stats.pixel_count, 4);
        assert_eq!(stats.mean_red, 60);
        assert_eq!(stats.mean_gray, 60);
    }

    #[test]
    fn test_empty_region_rejected() {
        let buf = ImageBuffer::filled(4, 4, 1, 0.0).unwrap();
        assert!(matches!(
            region_stats(&buf, 1, 1, 1, 3),
            Err(EngineError::InvalidParameter(_))
        ));
        assert!(matches!(
            region_stats(&buf, 5, 0, 9, 4),
            Err(EngineError::InvalidParameter(_))
        ));
    }
}

//! Median and weighted-median filtering.
//!
//! For every sample the zero-padded neighbourhood is turned into a multiset
//! in which each sample appears as many times as its [`RankWeights`] count,
//! and the median of that multiset becomes the output. The multiset is never
//! materialized: `(value, count)` pairs are sorted by value and the middle
//! positions are found by walking the cumulative count.
//!
//! When the multiset has an even number of elements the two middle values
//! are averaged before the result is truncated to a byte level.

use tracing::trace;

use crate::buffer::ImageBuffer;
use crate::convolve::PaddedPlane;
use crate::kernel::RankWeights;
use crate::scale::clip_sample;

/// Apply a (weighted) median filter to every channel of `buffer`.
///
/// Uniform weights give an ordinary median filter.
pub fn rank_filter(buffer: &ImageBuffer, weights: &RankWeights) -> ImageBuffer {
    let (height, width, channels) = (buffer.height(), buffer.width(), buffer.channels());
    let k = weights.size();
    let r = weights.radius();
    let counts = weights.counts();
    let total = weights.total();

    trace!(height, width, channels, size = k, total, "rank filtering");

    let mut out = vec![0.0f32; buffer.samples().len()];
    let mut window: Vec<(f32, u32)> = Vec::with_capacity(k * k);
    for c in 0..channels {
        let plane = PaddedPlane::new(buffer, c, r);
        for y in 0..height {
            for x in 0..width {
                window.clear();
                for ky in 0..k {
                    let row = plane.row(y + ky, x, k);
                    let crow = &counts[ky * k..(ky + 1) * k];
                    window.extend(
                        row.iter()
                            .zip(crow)
                            .filter(|pair| *pair.1 > 0)
                            .map(|(&v, &n)| (v, n)),
                    );
                }
                out[(y * width + x) * channels + c] = clip_sample(weighted_median(&mut window, total));
            }
        }
    }

    buffer.with_samples(out)
}

/// Median of the multiset described by `pairs`, whose counts sum to `total`.
///
/// Sorts `pairs` in place.
pub(crate) fn weighted_median(pairs: &mut [(f32, u32)], total: u64) -> f32 {
    if pairs.is_empty() || total == 0 {
        return 0.0;
    }
    pairs.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

    let lo_idx = (total - 1) / 2;
    let hi_idx = total / 2;
    let mut lo = None;
    let mut seen = 0u64;
    for &(value, count) in pairs.iter() {
        seen += count as u64;
        if lo.is_none() && seen > lo_idx {
            lo = Some(value);
        }
        if seen > hi_idx {
            // lo_idx <= hi_idx, so lo is set
            let lo = lo.unwrap_or(value);
            return if lo_idx == hi_idx { value } else { (lo + value) / 2.0 };
        }
    }
    pairs.last().map(|p| p.0).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(height: usize, width: usize, values: &[f32]) -> ImageBuffer {
        ImageBuffer::new(height, width, 1, values.to_vec()).unwrap()
    }

    /// Reference median by literally repeating every sample.
    fn expanded_median(pairs: &[(f32, u32)]) -> f32 {
        let mut all: Vec<f32> = pairs
            .iter()
            .flat_map(|&(v, n)| std::iter::repeat(v).take(n as usize))
            .collect();
        all.sort_by(|a, b| a.total_cmp(b));
        let n = all.len();
        if n % 2 == 1 {
            all[n / 2]
        } else {
            (all[n / 2 - 1] + all[n / 2]) / 2.0
        }
    }

    #[test]
    fn test_median_removes_outlier() {
        let mut values = vec![10.0; 25];
        values[12] = 255.0;
        let buf = gray(5, 5, &values);
        let out = rank_filter(&buf, &RankWeights::uniform(3).unwrap());
        assert_eq!(out.get(2, 2, 0), 10.0);
    }

    #[test]
    fn test_median_corner_sees_padding() {
        let buf = gray(3, 3, &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0]);
        let out = rank_filter(&buf, &RankWeights::uniform(3).unwrap());
        // five padded zeros outvote the four real samples
        assert_eq!(out.get(0, 0, 0), 0.0);
        assert_eq!(out.get(1, 1, 0), 50.0);
    }

    #[test]
    fn test_weighted_median_golden() {
        // corner (0, 0) multiset with weights 2 4 2 / 4 7 4 / 2 4 2:
        // 0 x14, 10 x7, 20 x4, 40 x4, 50 x2 -> 31 items, position 15 is 10
        let buf = gray(3, 3, &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0]);
        let weights = RankWeights::gaussian(3).unwrap();
        let out = rank_filter(&buf, &weights);
        assert_eq!(out.get(0, 0, 0), 10.0);
        assert_eq!(out.get(1, 1, 0), 50.0);
        // (2, 2): 0 x14, 50 x2, 60 x4, 80 x4, 90 x7 -> position 15 is 50
        assert_eq!(out.get(2, 2, 0), 50.0);
    }

    #[test]
    fn test_even_multiset_median_golden() {
        // only the centre and its right neighbour vote
        let weights = RankWeights::new(3, vec![0, 0, 0, 0, 1, 1, 0, 0, 0]).unwrap();
        let buf = gray(1, 2, &[10.0, 25.0]);
        let out = rank_filter(&buf, &weights);
        // (10 + 25) / 2 = 17.5 and (25 + 0) / 2 = 12.5, both truncated
        assert_eq!(out.samples(), &[17.0, 12.0]);
    }

    #[test]
    fn test_weighted_median_from_side_7_is_identity() {
        // only the centre keeps a non-zero count at these sides
        let data: Vec<f32> = (0..48).map(|v| (v * 37 % 256) as f32).collect();
        let buf = ImageBuffer::new(4, 4, 3, data).unwrap();
        for size in [7, 9] {
            let out = rank_filter(&buf, &RankWeights::gaussian(size).unwrap());
            assert_eq!(out, buf, "side {}", size);
        }
        let smoothed = rank_filter(&buf, &RankWeights::gaussian(5).unwrap());
        assert_ne!(smoothed, buf);
    }

    #[test]
    fn test_rgb_channels_independent() {
        let mut data = Vec::new();
        for i in 0..9 {
            data.extend_from_slice(&[i as f32 * 10.0, 100.0, 255.0 - i as f32]);
        }
        let buf = ImageBuffer::new(3, 3, 3, data).unwrap();
        let out = rank_filter(&buf, &RankWeights::uniform(1).unwrap());
        assert_eq!(out, buf);
    }

    #[test]
    fn test_weighted_median_matches_expansion() {
        let cases: Vec<Vec<(f32, u32)>> = vec![
            vec![(3.0, 1), (1.0, 2), (2.0, 1)],
            vec![(5.0, 3), (5.0, 1), (0.0, 4)],
            vec![(9.0, 7)],
            vec![(1.0, 1), (200.0, 1)],
        ];
        for case in cases {
            let total = case.iter().map(|p| p.1 as u64).sum();
            let expected = expanded_median(&case);
            let mut pairs = case.clone();
            assert_eq!(weighted_median(&mut pairs, total), expected, "{:?}", case);
        }
    }
}

//! Luma weighting used to reduce RGB buffers to a single gray channel.
//!
//! Uses ITU-R BT.601 coefficients, the same weighting desktop imaging
//! libraries apply when converting RGB to an 8-bit "L" image.

/// ITU-R BT.601 coefficient for red channel in luma calculation.
pub const LUMA_R: f32 = 0.299;

/// ITU-R BT.601 coefficient for green channel in luma calculation.
pub const LUMA_G: f32 = 0.587;

/// ITU-R BT.601 coefficient for blue channel in luma calculation.
pub const LUMA_B: f32 = 0.114;

/// Calculate the gray level of an RGB sample on the 0-255 scale.
///
/// The weighted sum is rounded and clamped so the result is always a
/// valid byte level, matching an 8-bit gray conversion.
#[inline]
pub fn gray_level(r: f32, g: f32, b: f32) -> f32 {
    (LUMA_R * r + LUMA_G * g + LUMA_B * b).round().clamp(0.0, 255.0)
}

/// Calculate the gray level of integer channel means.
///
/// Region analysis reports `int(0.299 R + 0.587 G + 0.114 B)` computed from
/// already truncated means, so this truncates rather than rounds.
#[inline]
pub fn gray_level_truncated(r: u32, g: u32, b: u32) -> u32 {
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficients_sum_to_one() {
        let sum = LUMA_R + LUMA_G + LUMA_B;
        assert!((sum - 1.0).abs() < 1e-6, "Coefficients should sum to 1.0");
    }

    #[test]
    fn test_gray_level_extremes() {
        assert_eq!(gray_level(255.0, 255.0, 255.0), 255.0);
        assert_eq!(gray_level(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_gray_level_preserves_gray() {
        for v in [0.0f32, 64.0, 128.0, 192.0, 255.0] {
            assert_eq!(gray_level(v, v, v), v, "Gray {} should map to itself", v);
        }
    }

    #[test]
    fn test_gray_level_primaries() {
        // 0.299 * 255 = 76.245
        assert_eq!(gray_level(255.0, 0.0, 0.0), 76.0);
        // 0.587 * 255 = 149.685
        assert_eq!(gray_level(0.0, 255.0, 0.0), 150.0);
        // 0.114 * 255 = 29.07
        assert_eq!(gray_level(0.0, 0.0, 255.0), 29.0);
    }

    #[test]
    fn test_gray_level_clamps_out_of_range() {
        assert_eq!(gray_level(400.0, 400.0, 400.0), 255.0);
        assert_eq!(gray_level(-20.0, -20.0, -20.0), 0.0);
    }

    #[test]
    fn test_gray_level_truncated() {
        // 0.299*100 + 0.587*150 + 0.114*200 = 29.9 + 88.05 + 22.8 = 140.75
        assert_eq!(gray_level_truncated(100, 150, 200), 140);
        assert_eq!(gray_level_truncated(0, 0, 0), 0);
    }
}

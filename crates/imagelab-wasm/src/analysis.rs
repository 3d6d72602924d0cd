//! Region statistics WASM binding.

use crate::types::{to_js_error, JsImage};
use imagelab_core::{region_stats as region_stats_core, EngineResult, RegionStats};
use wasm_bindgen::prelude::*;

/// Mean color of a rectangular selection.
///
/// Returns `{ pixel_count, mean_red, mean_green, mean_blue, mean_gray }`
/// for the half-open rectangle between the two corners.
#[wasm_bindgen]
pub fn region_stats(image: &JsImage, x0: u32, y0: u32, x1: u32, y1: u32) -> Result<JsValue, JsValue> {
    let stats = stats_inner(image, x0, y0, x1, y1).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&stats).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn stats_inner(image: &JsImage, x0: u32, y0: u32, x1: u32, y1: u32) -> EngineResult<RegionStats> {
    region_stats_core(
        &image.to_buffer()?,
        x0 as usize,
        y0 as usize,
        x1 as usize,
        y1 as usize,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_inner() {
        let img = JsImage::new(2, 1, 3, vec![10, 20, 30, 30, 40, 50]);
        let stats = stats_inner(&img, 0, 0, 2, 1).unwrap();
        assert_eq!(stats.pixel_count, 2);
        assert_eq!(stats.mean_red, 20);
        assert_eq!(stats.mean_green, 30);
        assert_eq!(stats.mean_blue, 40);
    }

    #[test]
    fn test_stats_inner_empty_region() {
        let img = JsImage::new(2, 2, 1, vec![0; 4]);
        assert!(stats_inner(&img, 1, 1, 1, 1).is_err());
    }
}

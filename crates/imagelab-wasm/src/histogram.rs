//! Histogram computation WASM bindings.
//!
//! This module provides JavaScript bindings for histogram computation,
//! allowing RGB and gray level histograms to be calculated from an image.

use crate::types::{to_js_error, JsImage};
use imagelab_core::histogram::compute_histogram as compute_histogram_core;
use imagelab_core::EngineResult;
use wasm_bindgen::prelude::*;

/// Histogram result accessible from JavaScript.
///
/// Contains 256-bin histograms for red, green, blue, and gray levels,
/// plus the largest bin count for normalizing a plot.
#[wasm_bindgen]
pub struct JsHistogram {
    red: Vec<u32>,
    green: Vec<u32>,
    blue: Vec<u32>,
    gray: Vec<u32>,
    max_value: u32,
}

#[wasm_bindgen]
impl JsHistogram {
    /// Get red channel histogram (256 bins).
    pub fn red(&self) -> Vec<u32> {
        self.red.clone()
    }

    /// Get green channel histogram (256 bins).
    pub fn green(&self) -> Vec<u32> {
        self.green.clone()
    }

    /// Get blue channel histogram (256 bins).
    pub fn blue(&self) -> Vec<u32> {
        self.blue.clone()
    }

    /// Get gray level histogram (256 bins).
    pub fn gray(&self) -> Vec<u32> {
        self.gray.clone()
    }

    /// Get maximum bin value across all four histograms.
    #[wasm_bindgen(getter)]
    pub fn max_value(&self) -> u32 {
        self.max_value
    }
}

/// Compute histograms of an image.
///
/// # Example (TypeScript)
/// ```typescript
/// const hist = compute_histogram(image);
/// const grayBins = hist.gray();      // Uint32Array[256]
/// const max = hist.max_value;        // For normalization
/// hist.free();
/// ```
#[wasm_bindgen]
pub fn compute_histogram(image: &JsImage) -> Result<JsHistogram, JsValue> {
    histogram_inner(image).map_err(to_js_error)
}

fn histogram_inner(image: &JsImage) -> EngineResult<JsHistogram> {
    let hist = compute_histogram_core(&image.to_buffer()?);

    Ok(JsHistogram {
        red: hist.red.to_vec(),
        green: hist.green.to_vec(),
        blue: hist.blue.to_vec(),
        gray: hist.gray.to_vec(),
        max_value: hist.max_value(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_histogram_creation() {
        let img = JsImage::new(3, 1, 3, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]);
        let hist = histogram_inner(&img).unwrap();

        assert_eq!(hist.red().len(), 256);
        assert_eq!(hist.green().len(), 256);
        assert_eq!(hist.blue().len(), 256);
        assert_eq!(hist.gray().len(), 256);
        assert_eq!(hist.red()[255], 1);
        assert_eq!(hist.red()[0], 2);
        assert_eq!(hist.max_value, 2);
    }

    #[test]
    fn test_js_histogram_max_value() {
        let img = JsImage::new(4, 1, 3, vec![128, 128, 128, 128, 128, 128, 128, 128, 128, 200, 200, 200]);
        let hist = histogram_inner(&img).unwrap();

        assert_eq!(hist.max_value, 3);
        assert_eq!(hist.red()[128], 3);
        assert_eq!(hist.gray()[200], 1);
    }

    #[test]
    fn test_js_histogram_gray_image() {
        let img = JsImage::new(2, 2, 1, vec![5, 5, 5, 9]);
        let hist = histogram_inner(&img).unwrap();
        assert_eq!(hist.gray()[5], 3);
        assert_eq!(hist.blue()[9], 1);
    }

    #[test]
    fn test_js_histogram_bad_shape() {
        let img = JsImage::new(2, 2, 3, vec![0u8; 3]);
        assert!(histogram_inner(&img).is_err());
    }
}

//! Kernel factory and distribution sampling WASM bindings.
//!
//! These let a dialog preview a kernel's weights or plot a noise
//! distribution without touching an image.

use crate::types::to_js_error;
use imagelab_core::kernel::make;
use imagelab_core::noise::sample_distribution;
use imagelab_core::{EngineResult, KernelKind, NoiseKind};
use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;

/// Build a kernel and return its weights with the factor applied.
///
/// # Arguments
///
/// * `kind` - Kernel family name, e.g. `"gaussian"` or `"sobel_h"`
/// * `size` - Side length, or sigma for `"gaussian"` and
///   `"laplacian_of_gaussian"`
///
/// # Returns
///
/// Row-major weights as a Float32Array of length `k * k`.
#[wasm_bindgen]
pub fn make_kernel(kind: JsValue, size: usize) -> Result<Vec<f32>, JsValue> {
    let kind: KernelKind = serde_wasm_bindgen::from_value(kind)
        .map_err(|e| JsValue::from_str(&format!("Invalid kernel kind: {}", e)))?;
    kernel_weights(kind, size).map_err(to_js_error)
}

/// Draw `count` samples from a noise distribution.
///
/// # Arguments
///
/// * `kind` - `"normal"`, `"rayleigh"` or `"exponential"`
/// * `scale` - Distribution scale
/// * `count` - Number of samples
/// * `seed` - Random seed for reproducible plots
#[wasm_bindgen]
pub fn sample_noise(kind: JsValue, scale: f64, count: usize, seed: u64) -> Result<Vec<f64>, JsValue> {
    let kind: NoiseKind = serde_wasm_bindgen::from_value(kind)
        .map_err(|e| JsValue::from_str(&format!("Invalid noise kind: {}", e)))?;
    sample_inner(kind, scale, count, seed).map_err(to_js_error)
}

fn kernel_weights(kind: KernelKind, size: usize) -> EngineResult<Vec<f32>> {
    Ok(make(kind, size)?.scaled_weights())
}

fn sample_inner(kind: NoiseKind, scale: f64, count: usize, seed: u64) -> EngineResult<Vec<f64>> {
    sample_distribution(kind, scale, count, &mut StdRng::seed_from_u64(seed))
}

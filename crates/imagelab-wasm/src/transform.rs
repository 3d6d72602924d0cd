//! WASM bindings for the engine's transform entry point.
//!
//! Operations arrive as plain JavaScript objects tagged with `op`, for
//! example `{ op: "filter", kind: "gaussian", size: 2, mode: "rescale" }`,
//! and are deserialized into the core `Operation` enum.

use crate::types::{to_js_error, JsImage};
use imagelab_core::point::{estimate_threshold, subtract};
use imagelab_core::{transform, transform_with_rng, EngineResult, Operation};
use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;

/// Apply one engine operation to an image.
///
/// # Arguments
///
/// * `image` - Source image (gray or RGB)
/// * `gray_mode` - Reduce to a single gray channel before processing
/// * `op` - Operation descriptor object
///
/// # Returns
///
/// New `JsImage` with the result. Gray mode and gray-only operations
/// return a single-channel image.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const smoothed = apply_operation(image, false, { op: "median", size: 3 });
/// const edges = apply_operation(image, true, { op: "gradient", operator: "sobel" });
/// const crossings = apply_operation(image, true, { op: "log_edges", sigma: 1.5 });
/// const cartoon = apply_operation(image, false, {
///   op: "diffusion", mode: "anisotropic", iterations: 20, sigma: 8,
/// });
/// ```
#[wasm_bindgen]
pub fn apply_operation(image: &JsImage, gray_mode: bool, op: JsValue) -> Result<JsImage, JsValue> {
    let operation = parse_operation(op)?;
    run_operation(image, gray_mode, &operation, None).map_err(to_js_error)
}

/// Apply one engine operation with a seeded random source.
///
/// Identical seeds give identical noise, which keeps previews stable while
/// a dialog is open.
#[wasm_bindgen]
pub fn apply_operation_seeded(
    image: &JsImage,
    gray_mode: bool,
    op: JsValue,
    seed: u64,
) -> Result<JsImage, JsValue> {
    let operation = parse_operation(op)?;
    run_operation(image, gray_mode, &operation, Some(seed)).map_err(to_js_error)
}

/// Subtract `b` from `a` and rescale the difference to the full byte range.
#[wasm_bindgen]
pub fn subtract_images(a: &JsImage, b: &JsImage) -> Result<JsImage, JsValue> {
    subtract_inner(a, b).map_err(to_js_error)
}

/// Threshold the iterative search settles on for an image's gray levels.
#[wasm_bindgen]
pub fn optimal_threshold(image: &JsImage) -> Result<f64, JsValue> {
    let gray = image.to_buffer().map_err(to_js_error)?.to_gray();
    Ok(estimate_threshold(gray.samples()).threshold)
}

fn parse_operation(op: JsValue) -> Result<Operation, JsValue> {
    serde_wasm_bindgen::from_value(op)
        .map_err(|e| JsValue::from_str(&format!("Invalid operation: {}", e)))
}

pub(crate) fn run_operation(
    image: &JsImage,
    gray_mode: bool,
    operation: &Operation,
    seed: Option<u64>,
) -> EngineResult<JsImage> {
    let buffer = image.to_buffer()?;
    let output = match seed {
        Some(seed) => transform_with_rng(&buffer, gray_mode, operation, &mut StdRng::seed_from_u64(seed))?,
        None => transform(&buffer, gray_mode, operation)?,
    };
    Ok(JsImage::from_buffer(&output))
}

fn subtract_inner(a: &JsImage, b: &JsImage) -> EngineResult<JsImage> {
    let diff = subtract(&a.to_buffer()?, &b.to_buffer()?)?;
    Ok(JsImage::from_buffer(&diff))
}

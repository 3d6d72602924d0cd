//! Imagelab WASM - WebAssembly bindings for Imagelab
//!
//! This crate provides WASM bindings to expose the imagelab-core engine
//! to JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper type for image data
//! - `transform` - The operation entry point, subtraction and thresholding
//! - `histogram` - RGB and gray level histograms
//! - `kernel` - Kernel weights and noise distribution samples
//! - `analysis` - Region statistics
//!
//! # Usage
//!
//! ```typescript
//! import init, { apply_operation, JsImage } from '@imagelab/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const image = new JsImage(width, height, 3, pixels);
//! const blurred = apply_operation(image, false, { op: "filter", kind: "gaussian", size: 2 });
//! ```

use wasm_bindgen::prelude::*;

mod analysis;
mod histogram;
mod kernel;
mod transform;
mod types;

// Re-export public types
pub use analysis::region_stats;
pub use histogram::{compute_histogram, JsHistogram};
pub use kernel::{make_kernel, sample_noise};
pub use transform::{apply_operation, apply_operation_seeded, optimal_threshold, subtract_images};
pub use types::JsImage;

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}

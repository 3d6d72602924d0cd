//! WASM-compatible wrapper types for image data.
//!
//! This module provides JavaScript-friendly types that wrap the core engine
//! buffer, handling the conversion between byte pixels and float samples.

use imagelab_core::{EngineResult, ImageBuffer};
use wasm_bindgen::prelude::*;

/// An 8-bit image passed between JavaScript and the engine.
///
/// Pixels are row-major with `channels` interleaved bytes per pixel, where
/// `channels` is 1 (gray) or 3 (RGB).
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy is made
/// to JavaScript memory as a `Uint8Array`.
#[wasm_bindgen]
pub struct JsImage {
    width: u32,
    height: u32,
    channels: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsImage {
    /// Create a new JsImage from dimensions and pixel data.
    ///
    /// # Arguments
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `channels` - 1 for gray, 3 for RGB
    /// * `pixels` - Pixel data (`channels` bytes per pixel, row-major order)
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, channels: u32, pixels: Vec<u8>) -> JsImage {
        JsImage {
            width,
            height,
            channels,
            pixels,
        }
    }

    /// Get the image width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the image height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the number of interleaved channels
    #[wasm_bindgen(getter)]
    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Get the number of bytes in the pixel buffer
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns pixel data as Uint8Array.
    ///
    /// Note: This creates a copy of the pixel data.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    ///
    /// This is optional - wasm-bindgen's finalizer will handle cleanup automatically.
    pub fn free(self) {
        // Dropping self releases the memory
    }
}

impl JsImage {
    /// Widen into an engine buffer, validating the shape.
    pub(crate) fn to_buffer(&self) -> EngineResult<ImageBuffer> {
        ImageBuffer::from_u8(
            self.height as usize,
            self.width as usize,
            self.channels as usize,
            &self.pixels,
        )
    }

    /// Narrow an engine buffer into a new JsImage.
    pub(crate) fn from_buffer(buffer: &ImageBuffer) -> Self {
        Self {
            width: buffer.width() as u32,
            height: buffer.height() as u32,
            channels: buffer.channels() as u32,
            pixels: buffer.to_u8(),
        }
    }
}

/// Map an engine error onto a JavaScript exception value.
pub(crate) fn to_js_error(e: imagelab_core::EngineError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

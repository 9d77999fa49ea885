//! OCR Worker
//!
//! Runs one decoded image through the shared engine. Never fails: any error
//! is logged and reported as "no text".

use std::sync::Arc;

use image::{DynamicImage, RgbImage};

use super::engine::OcrEngine;
use super::types::output_to_text;

pub struct OcrWorker {
    engine: Arc<dyn OcrEngine>,
    classify_angle: bool,
}

impl OcrWorker {
    pub fn new(engine: Arc<dyn OcrEngine>, classify_angle: bool) -> Self {
        Self {
            engine,
            classify_angle,
        }
    }

    pub fn engine(&self) -> &Arc<dyn OcrEngine> {
        &self.engine
    }

    /// Recognize text in `image`, returning an empty string on failure
    pub fn recognize(&self, image: DynamicImage) -> String {
        let rgb = to_rgb(image);

        match self.engine.recognize(&rgb, self.classify_angle) {
            Ok(output) => output_to_text(output),
            Err(e) => {
                tracing::warn!(engine = self.engine.name(), "OCR processing failed: {}", e);
                String::new()
            }
        }
    }
}

/// Normalize any color model to 8-bit RGB
fn to_rgb(image: DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => {
            tracing::debug!(color = ?other.color(), "Converting image to RGB");
            other.to_rgb8()
        }
    }
}

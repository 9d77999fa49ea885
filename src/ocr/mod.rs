//! OCR Module
//!
//! Recovers text from raster images embedded in EPUBs.
//!
//! - [`OcrEngine`]: blocking backend trait (Tesseract CLI, JSON-emitting command)
//! - [`OcrWorker`]: color normalization + engine call, never fails
//! - [`OcrPool`]: bounded pool running workers off the async path
//!
//! ## Usage
//!
//! ```rust,ignore
//! use epub_ocr_server::ocr::{OcrPool, OcrWorker, TesseractEngine};
//!
//! let engine = Arc::new(TesseractEngine::new("tesseract", "eng"));
//! let pool = OcrPool::new(OcrWorker::new(engine, true), 4);
//!
//! let handle = pool.submit(move |worker| worker.recognize(image));
//! let text = handle.await?;
//! ```

mod engine;
mod pool;
mod types;
mod worker;

use std::sync::Arc;

use crate::config::{OcrConfig, OcrEngineKind};

pub use engine::{CommandEngine, OcrEngine, TesseractEngine};
pub use pool::OcrPool;
pub use types::{
    output_to_text, parse_paddle_json, parse_tesseract_tsv, EngineOutput, OcrError, OcrLine,
};
pub use worker::OcrWorker;

/// Build the process-wide engine handle from configuration
pub fn engine_from_config(config: &OcrConfig) -> Result<Arc<dyn OcrEngine>, OcrError> {
    let engine: Arc<dyn OcrEngine> = match config.engine {
        OcrEngineKind::Tesseract => {
            Arc::new(TesseractEngine::new(&config.tesseract_bin, &config.language))
        }
        OcrEngineKind::Command => Arc::new(CommandEngine::new(&config.command)?),
    };
    Ok(engine)
}

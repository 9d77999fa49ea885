//! Extraction pipeline
//!
//! Produces the transcript for one EPUB: chapter text first, then text
//! recognized in embedded images, separated by a blank line.
//!
//! # Failure policy
//!
//! - The book must parse as an EPUB; otherwise [`ExtractError`] is returned.
//! - Image OCR is best effort. A corrupt raw archive, an undecodable image or
//!   an engine failure only shortens the transcript.

mod images;
mod transcript;

use std::path::Path;

use thiserror::Error;

use crate::epub::{collect_markup_text, EpubParser, ParseError};
use crate::ocr::OcrPool;

pub use images::{
    classify_images, ImageEntry, ImagePipeline, IMAGE_EXTENSIONS, MAX_IMAGE_BYTES,
};
pub use transcript::{join_blocks, BLOCK_SEPARATOR};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Image entry too large: {0} bytes")]
    ImageTooLarge(u64),

    #[error("Task join error: {0}")]
    Task(String),
}

/// Top-level EPUB to text extractor.
///
/// Cheap to clone; the OCR pool (and its engine) is shared.
#[derive(Clone)]
pub struct EpubExtractor {
    images: ImagePipeline,
}

impl EpubExtractor {
    pub fn new(pool: OcrPool) -> Self {
        Self {
            images: ImagePipeline::new(pool),
        }
    }

    pub fn pool(&self) -> &OcrPool {
        self.images.pool()
    }

    /// Extract the full transcript of the EPUB at `path`
    pub async fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        let owned = path.to_path_buf();
        let book = tokio::task::spawn_blocking(move || EpubParser::from_path(&owned)?.read_book())
            .await
            .map_err(|e| ExtractError::Task(e.to_string()))?
            .map_err(|e| {
                tracing::error!(path = %path.display(), "Error extracting text from EPUB: {}", e);
                e
            })?;

        let markup = async move {
            tokio::task::spawn_blocking(move || collect_markup_text(&book.items))
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!("Markup text collection aborted: {}", e);
                    String::new()
                })
        };

        let (text, image_text) = tokio::join!(markup, self.images.extract(path));

        tracing::info!(
            path = %path.display(),
            text_chars = text.len(),
            image_chars = image_text.len(),
            "EPUB extraction complete"
        );

        Ok(join_blocks([text, image_text]))
    }
}

//! Embedded image OCR
//!
//! Opens the EPUB as a raw ZIP, picks the raster images by name and OCRs
//! them through the bounded pool. Results keep archive order no matter which
//! image finishes first.

use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use image::DynamicImage;
use zip::ZipArchive;

use super::transcript::join_blocks;
use super::ExtractError;
use crate::ocr::OcrPool;

/// Raster formats worth sending to OCR
pub const IMAGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".bmp"];

/// Largest image entry read into memory
pub const MAX_IMAGE_BYTES: u64 = 64 * 1024 * 1024;

/// Archive handle shared by image jobs. Clones share the parsed central
/// directory but read through their own cursor.
type SharedArchive = ZipArchive<Cursor<Arc<[u8]>>>;

/// An OCR candidate inside the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    /// Position in the archive's central directory
    pub index: usize,
    /// Full entry path
    pub name: String,
}

/// Select the entries whose name ends with a raster image suffix
/// (ASCII case-insensitive), preserving listing order.
pub fn classify_images(names: &[String]) -> Vec<ImageEntry> {
    names
        .iter()
        .enumerate()
        .filter(|(_, name)| is_image_name(name))
        .map(|(index, name)| ImageEntry {
            index,
            name: name.clone(),
        })
        .collect()
}

fn is_image_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// OCRs every embedded image of an archive
#[derive(Clone)]
pub struct ImagePipeline {
    pool: OcrPool,
}

impl ImagePipeline {
    pub fn new(pool: OcrPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &OcrPool {
        &self.pool
    }

    /// Recognize text in all images of the archive at `path`.
    ///
    /// Never fails: an unreadable archive or image simply contributes no
    /// text. Segments are joined with a blank line in archive order.
    pub async fn extract(&self, path: &Path) -> String {
        let (archive, names) = match open_archive(path).await {
            Ok(opened) => opened,
            Err(e) => {
                tracing::error!(path = %path.display(), "Error extracting images from EPUB: {}", e);
                return String::new();
            }
        };

        let entries = classify_images(&names);
        if entries.is_empty() {
            tracing::debug!(path = %path.display(), "No images to OCR");
            return String::new();
        }

        tracing::info!(
            images = entries.len(),
            workers = self.pool.size(),
            "Running OCR on embedded images"
        );

        let handles: Vec<_> = entries
            .iter()
            .cloned()
            .map(|entry| {
                let mut archive = archive.clone();
                self.pool.submit(move |worker| match load_image(&mut archive, &entry) {
                    Ok(image) => worker.recognize(image),
                    Err(e) => {
                        tracing::warn!(image = %entry.name, "Error processing image: {}", e);
                        String::new()
                    }
                })
            })
            .collect();

        let results = join_all(handles).await;

        let texts: Vec<String> = results
            .into_iter()
            .zip(&entries)
            .map(|(result, entry)| {
                result.unwrap_or_else(|e| {
                    tracing::warn!(image = %entry.name, "Error processing image: {}", e);
                    String::new()
                })
            })
            .collect();

        let recognized = texts.iter().filter(|t| !t.trim().is_empty()).count();
        tracing::info!(
            images = entries.len(),
            recognized,
            "Finished OCR on embedded images"
        );

        join_blocks(texts)
    }
}

/// Read the archive into memory and list its entry names in central
/// directory order
async fn open_archive(path: &Path) -> Result<(SharedArchive, Vec<String>), ExtractError> {
    let data: Arc<[u8]> = tokio::fs::read(path).await?.into();

    tokio::task::spawn_blocking(move || -> Result<(SharedArchive, Vec<String>), ExtractError> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let names = (0..archive.len())
            .map(|i| {
                archive
                    .by_index(i)
                    .map(|file| file.name().to_string())
                    .unwrap_or_default()
            })
            .collect();
        Ok((archive, names))
    })
    .await
    .map_err(|e| ExtractError::Task(e.to_string()))?
}

/// Read and decode one image entry.
///
/// The declared uncompressed size comes from the upload and is only used to
/// reject entries up front; the read itself is capped at [`MAX_IMAGE_BYTES`].
fn load_image(archive: &mut SharedArchive, entry: &ImageEntry) -> Result<DynamicImage, ExtractError> {
    let file = archive.by_index(entry.index)?;
    if file.size() > MAX_IMAGE_BYTES {
        return Err(ExtractError::ImageTooLarge(file.size()));
    }

    let mut data = Vec::new();
    file.take(MAX_IMAGE_BYTES + 1).read_to_end(&mut data)?;
    if data.len() as u64 > MAX_IMAGE_BYTES {
        return Err(ExtractError::ImageTooLarge(data.len() as u64));
    }

    Ok(image::load_from_memory(&data)?)
}

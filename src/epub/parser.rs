//! EPUB parser using rbook
//!
//! Wraps the rbook crate to turn an EPUB on disk into a [`ParsedBook`].

use std::path::Path;

use rbook::prelude::*;
use rbook::Epub;
use thiserror::Error;

use super::types::{BookItem, ItemKind, ParsedBook};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to open EPUB: {0}")]
    OpenError(String),
}

/// EPUB parser that maintains an open book
pub struct EpubParser {
    epub: Epub,
}

impl EpubParser {
    /// Open an EPUB from a file path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let path = path.as_ref();

        // Lenient parsing tolerates EPUBs with incomplete metadata
        let epub = Epub::options()
            .strict(false)
            .open(path)
            .map_err(|e| ParseError::OpenError(e.to_string()))?;

        Ok(Self { epub })
    }

    /// Read every manifest item in manifest order, loading markup for
    /// content documents.
    ///
    /// A document whose bytes cannot be read is kept without content and
    /// logged; it contributes no text downstream.
    pub fn read_book(&self) -> Result<ParsedBook, ParseError> {
        let title = self
            .epub
            .metadata()
            .title()
            .map(|t| t.value().to_string());

        let mut items = Vec::new();
        for entry in self.epub.manifest().entries() {
            let media_type = entry.media_type().to_string();
            let kind = ItemKind::classify(&media_type);
            let href = entry.href().to_string();

            let content = if kind == ItemKind::Document {
                match self.epub.read_resource_str(entry.href()) {
                    Ok(html) => Some(html),
                    Err(e) => {
                        tracing::warn!(href = %href, "Skipping unreadable document: {}", e);
                        None
                    }
                }
            } else {
                None
            };

            items.push(BookItem {
                id: entry.id().to_string(),
                href,
                media_type,
                kind,
                content,
            });
        }

        tracing::debug!(
            items = items.len(),
            documents = items.iter().filter(|i| i.is_document()).count(),
            "Parsed EPUB manifest"
        );

        Ok(ParsedBook { title, items })
    }
}

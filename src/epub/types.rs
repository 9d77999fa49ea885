//! EPUB types

use serde::Serialize;

/// Classification of a manifest item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// XHTML content document (chapter, section)
    Document,
    /// NCX table of contents
    Navigation,
    Image,
    Style,
    Font,
    Other,
}

impl ItemKind {
    /// Classify a manifest item from its media type.
    ///
    /// The EPUB 3 navigation document is XHTML and counts as a document.
    pub fn classify(media_type: &str) -> Self {
        let media_type = media_type.trim().to_ascii_lowercase();

        match media_type.as_str() {
            "application/x-dtbncx+xml" => ItemKind::Navigation,
            "application/xhtml+xml" | "text/html" => ItemKind::Document,
            "text/css" => ItemKind::Style,
            t if t.starts_with("image/") => ItemKind::Image,
            t if t.starts_with("font/")
                || t.starts_with("application/font")
                || t.starts_with("application/x-font")
                || t == "application/vnd.ms-opentype" =>
            {
                ItemKind::Font
            }
            _ => ItemKind::Other,
        }
    }
}

/// One manifest item of a parsed book
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub kind: ItemKind,
    /// Raw markup, loaded for documents only
    #[serde(skip)]
    pub content: Option<String>,
}

impl BookItem {
    pub fn is_document(&self) -> bool {
        self.kind == ItemKind::Document
    }
}

/// Parsed book structure: manifest items in manifest order
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedBook {
    pub title: Option<String>,
    pub items: Vec<BookItem>,
}

impl ParsedBook {
    pub fn documents(&self) -> impl Iterator<Item = &BookItem> {
        self.items.iter().filter(|item| item.is_document())
    }
}

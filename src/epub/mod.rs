//! EPUB reading
//!
//! Parses the package with rbook and turns content documents into plain text.

mod parser;
mod text;
mod types;

pub use parser::{EpubParser, ParseError};
pub use text::{collect_markup_text, html_to_text};
pub use types::{BookItem, ItemKind, ParsedBook};

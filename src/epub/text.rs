//! Markup text collection
//!
//! Strips XHTML content documents down to their visible text using lol_html.
//! Two passes: the first drops scripts, styles and templates, the second
//! collects every remaining text node (including the head `<title>`).

use lol_html::{doc_text, element, rewrite_str, RewriteStrSettings};

use super::types::BookItem;
use crate::extract::join_blocks;

/// Elements whose content is code or inert markup rather than text
const HIDDEN_ELEMENTS: &str = "script, style, template, noscript";

/// Join the text of every content document, in item order
pub fn collect_markup_text(items: &[BookItem]) -> String {
    join_blocks(
        items
            .iter()
            .filter(|item| item.is_document())
            .filter_map(|item| item.content.as_deref())
            .map(html_to_text),
    )
}

/// Convert one markup document to whitespace-normalized text.
///
/// Tags become single spaces. Malformed markup never errors: whatever text
/// was recovered before the rewriter gave up is returned.
pub fn html_to_text(html: &str) -> String {
    let visible = strip_hidden_elements(html);

    let mut raw = String::new();
    let result = rewrite_str(
        &visible,
        RewriteStrSettings {
            document_content_handlers: vec![doc_text!(|chunk| {
                raw.push_str(chunk.as_str());
                if chunk.last_in_text_node() {
                    raw.push(' ');
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    );

    if let Err(e) = result {
        tracing::debug!("Markup rewrite stopped early: {}", e);
    }

    normalize_whitespace(&html_escape::decode_html_entities(&raw))
}

fn strip_hidden_elements(html: &str) -> String {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(HIDDEN_ELEMENTS, |el| {
                el.remove();
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .unwrap_or_else(|e| {
        tracing::debug!("Could not strip hidden elements: {}", e);
        html.to_string()
    })
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

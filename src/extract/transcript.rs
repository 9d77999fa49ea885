//! Transcript assembly

/// Separator between text units
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Join text units with a blank line, dropping units that carry no text so
/// no separator is emitted for them.
pub fn join_blocks<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for part in parts {
        let part = part.as_ref();
        if part.trim().is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push_str(BLOCK_SEPARATOR);
        }
        out.push_str(part);
    }
    out
}

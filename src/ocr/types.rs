//! OCR Types
//!
//! Defines the line model shared by every engine and the parsers that turn
//! engine wire formats into it.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// One recognized line of text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrLine {
    /// Recognized text
    pub text: String,
    /// Engine confidence (scale depends on the engine)
    pub confidence: f32,
}

impl OcrLine {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Raw engine result: `None` when the engine produced nothing, otherwise a
/// sequence of line groups.
pub type EngineOutput = Option<Vec<Vec<OcrLine>>>;

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    EngineNotAvailable(String),

    #[error("Failed to encode image for OCR: {0}")]
    ImageEncoding(String),

    #[error("OCR processing failed: {0}")]
    ProcessingError(String),

    #[error("Unreadable engine output: {0}")]
    MalformedOutput(String),
}

/// Flatten an engine result into a single line of text.
///
/// Only the first line group is used, matching engines that return one group
/// per input image. Blank lines are skipped.
pub fn output_to_text(output: EngineOutput) -> String {
    let Some(groups) = output else {
        return String::new();
    };
    let Some(first) = groups.into_iter().next() else {
        return String::new();
    };

    first
        .iter()
        .map(|line| line.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse PaddleOCR-style JSON: `[[ [box, [text, confidence]], ... ], ...]`.
///
/// `null` maps to `None`. Lines that do not have the expected shape are
/// dropped rather than failing the whole result.
pub fn parse_paddle_json(value: &Value) -> EngineOutput {
    let groups = value.as_array()?;

    let parsed = groups
        .iter()
        .map(|group| {
            group
                .as_array()
                .map(|lines| lines.iter().filter_map(parse_paddle_line).collect())
                .unwrap_or_default()
        })
        .collect();

    Some(parsed)
}

fn parse_paddle_line(line: &Value) -> Option<OcrLine> {
    let parts = line.as_array()?;
    if parts.len() < 2 {
        return None;
    }

    match &parts[1] {
        Value::Array(recognition) => {
            let text = recognition.first()?.as_str()?;
            let confidence = recognition.get(1).and_then(Value::as_f64).unwrap_or(0.0);
            Some(OcrLine::new(text, confidence as f32))
        }
        // Some wrappers emit the text without a confidence
        Value::String(text) => Some(OcrLine::new(text.as_str(), 0.0)),
        _ => None,
    }
}

/// Parse `tesseract ... tsv` output into a single line group.
///
/// Word rows (level 5) are grouped by `(block, paragraph, line)` in order of
/// appearance; the line confidence is the mean of its word confidences.
/// Rows with missing columns or non-numeric fields are skipped.
pub fn parse_tesseract_tsv(tsv: &str) -> EngineOutput {
    let mut lines: BTreeMap<(u32, u32, u32), (usize, Vec<String>, Vec<f32>)> = BTreeMap::new();
    let mut order = 0usize;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }

        let key = match (cols[2].parse(), cols[3].parse(), cols[4].parse()) {
            (Ok(block), Ok(par), Ok(line)) => (block, par, line),
            _ => continue,
        };
        let Ok(confidence) = cols[10].parse::<f32>() else {
            continue;
        };
        let word = cols[11].trim();
        if word.is_empty() {
            continue;
        }

        let entry = lines.entry(key).or_insert_with(|| {
            order += 1;
            (order, Vec::new(), Vec::new())
        });
        entry.1.push(word.to_string());
        entry.2.push(confidence);
    }

    if lines.is_empty() {
        return None;
    }

    let mut ordered: Vec<_> = lines.into_values().collect();
    ordered.sort_by_key(|(order, _, _)| *order);

    let group = ordered
        .into_iter()
        .map(|(_, words, confidences)| {
            let mean = confidences.iter().sum::<f32>() / confidences.len() as f32;
            OcrLine::new(words.join(" "), mean)
        })
        .collect();

    Some(vec![group])
}

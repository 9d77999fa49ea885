//! OCR Engines
//!
//! Defines the engine trait and the process-backed implementations. Every
//! call spawns its own child process, so one engine handle can be shared by
//! all pool workers without locking.

use std::io::{Cursor, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use image::RgbImage;

use super::types::{parse_paddle_json, parse_tesseract_tsv, EngineOutput, OcrError};

/// A blocking OCR backend.
///
/// Implementations are invoked from blocking pool threads and must tolerate
/// concurrent calls.
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs and health output
    fn name(&self) -> &'static str;

    /// Check if the engine can be invoked
    fn is_available(&self) -> bool;

    /// Recognize text in an RGB image
    fn recognize(&self, image: &RgbImage, classify_angle: bool) -> Result<EngineOutput, OcrError>;
}

/// Tesseract CLI engine
pub struct TesseractEngine {
    binary: String,
    language: String,
}

impl TesseractEngine {
    pub fn new(binary: &str, language: &str) -> Self {
        Self {
            binary: binary.to_string(),
            language: language.to_string(),
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn recognize(&self, image: &RgbImage, classify_angle: bool) -> Result<EngineOutput, OcrError> {
        let png = encode_png(image)?;

        // psm 1 = automatic segmentation with orientation detection
        let psm = if classify_angle { "1" } else { "3" };

        let mut command = Command::new(&self.binary);
        command
            .arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(psm)
            .arg("tsv");

        let stdout = run_with_stdin(command, png)?;
        Ok(parse_tesseract_tsv(&stdout))
    }
}

/// Engine that pipes a PNG into an external command printing
/// PaddleOCR-style JSON on stdout.
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(command: &[String]) -> Result<Self, OcrError> {
        let (program, args) = command.split_first().ok_or_else(|| {
            OcrError::EngineNotAvailable("OCR command is empty".to_string())
        })?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl OcrEngine for CommandEngine {
    fn name(&self) -> &'static str {
        "command"
    }

    fn is_available(&self) -> bool {
        find_program(&self.program).is_some()
    }

    fn recognize(&self, image: &RgbImage, classify_angle: bool) -> Result<EngineOutput, OcrError> {
        let png = encode_png(image)?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env("OCR_USE_ANGLE_CLS", if classify_angle { "1" } else { "0" });

        let stdout = run_with_stdin(command, png)?;
        if stdout.trim().is_empty() {
            return Ok(None);
        }

        let value: serde_json::Value = serde_json::from_str(&stdout)
            .map_err(|e| OcrError::MalformedOutput(e.to_string()))?;
        Ok(parse_paddle_json(&value))
    }
}

fn encode_png(image: &RgbImage) -> Result<Vec<u8>, OcrError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| OcrError::ImageEncoding(e.to_string()))?;
    Ok(buffer)
}

/// Run a command with `input` on stdin, returning stdout as text
fn run_with_stdin(mut command: Command, input: Vec<u8>) -> Result<String, OcrError> {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| OcrError::EngineNotAvailable(format!("Failed to start OCR engine: {}", e)))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| OcrError::ProcessingError("OCR engine stdin unavailable".to_string()))?;

    // stdin is written on its own thread while stdout drains
    let writer = std::thread::spawn(move || stdin.write_all(&input));

    let output = child
        .wait_with_output()
        .map_err(|e| OcrError::ProcessingError(format!("Failed to wait for OCR engine: {}", e)))?;

    let written = writer.join();

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(OcrError::ProcessingError(format!(
            "OCR engine exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    match written {
        Ok(Ok(())) => {}
        // The engine finished without consuming all of stdin
        Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {
            tracing::debug!("OCR engine closed stdin early");
        }
        Ok(Err(e)) => {
            return Err(OcrError::ProcessingError(format!(
                "Failed to write image to OCR engine: {}",
                e
            )))
        }
        Err(_) => {
            return Err(OcrError::ProcessingError(
                "OCR engine writer thread panicked".to_string(),
            ))
        }
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Resolve a program name against `PATH` (or check it directly if it has a
/// path component)
fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(program))
            .find(|path| path.is_file())
    })
}

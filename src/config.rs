//! Configuration management for the EPUB text server

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Default upload ceiling: 50 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Default number of concurrent OCR invocations
pub const DEFAULT_OCR_WORKERS: usize = 4;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted EPUB payload in bytes
    pub max_file_size: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub engine: OcrEngineKind,
    /// Size of the OCR worker pool
    pub workers: usize,
    pub language: String,
    pub angle_classification: bool,
    pub tesseract_bin: String,
    /// Program and arguments for [`OcrEngineKind::Command`]
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrEngineKind {
    Tesseract,
    Command,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            upload: UploadConfig {
                max_file_size: DEFAULT_MAX_FILE_SIZE,
            },
            ocr: OcrConfig::default(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        OcrConfig {
            engine: OcrEngineKind::Tesseract,
            workers: DEFAULT_OCR_WORKERS,
            language: "eng".to_string(),
            angle_classification: true,
            tesseract_bin: "tesseract".to_string(),
            command: Vec::new(),
        }
    }
}

/// Configuration that cannot be used as given
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set when OCR_ENGINE={1}")]
    MissingVar(&'static str, &'static str),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from a variable lookup.
    ///
    /// Malformed values fall back to their defaults; a missing variable the
    /// chosen engine depends on is an error.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let engine = match var("OCR_ENGINE")
            .unwrap_or_else(|| "tesseract".to_string())
            .trim()
            .to_lowercase()
            .as_str()
        {
            "command" => OcrEngineKind::Command,
            "tesseract" => OcrEngineKind::Tesseract,
            other => {
                tracing::warn!(engine = %other, "Unknown OCR_ENGINE, falling back to tesseract");
                OcrEngineKind::Tesseract
            }
        };

        let command: Vec<String> = match engine {
            OcrEngineKind::Command => var("OCR_COMMAND")
                .map(|raw| raw.split_whitespace().map(str::to_string).collect::<Vec<_>>())
                .filter(|parts| !parts.is_empty())
                .ok_or(ConfigError::MissingVar("OCR_COMMAND", "command"))?,
            OcrEngineKind::Tesseract => Vec::new(),
        };

        Ok(Config {
            server: ServerConfig {
                host: var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var(&var, "SERVER_PORT", defaults.server.port),
            },
            upload: UploadConfig {
                max_file_size: parse_var(&var, "MAX_UPLOAD_BYTES", defaults.upload.max_file_size),
            },
            ocr: OcrConfig {
                engine,
                workers: parse_var(&var, "OCR_WORKERS", defaults.ocr.workers).max(1),
                language: var("OCR_LANGUAGE").unwrap_or(defaults.ocr.language),
                angle_classification: parse_var(
                    &var,
                    "OCR_ANGLE_CLASSIFICATION",
                    defaults.ocr.angle_classification,
                ),
                tesseract_bin: var("TESSERACT_BIN").unwrap_or(defaults.ocr.tesseract_bin),
                command,
            },
        })
    }
}

/// Read and parse a variable, keeping the default when unset or malformed
fn parse_var<F, T>(var: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "Invalid value, using default");
            default
        }),
        None => default,
    }
}

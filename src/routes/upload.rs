//! EPUB upload route
//!
//! Endpoints:
//! - POST /upload-epub - Extract text (and OCR text) from an uploaded EPUB

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Allowance on top of the file limit for multipart framing
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

#[derive(Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub text: String,
    pub status: &'static str,
}

/// Create the upload router
pub fn router(max_file_size: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_file_size.saturating_add(MULTIPART_OVERHEAD))
        .unwrap_or(usize::MAX);

    Router::new()
        .route("/upload-epub", post(upload_epub))
        .layer(DefaultBodyLimit::max(body_limit))
}

/// POST /upload-epub
///
/// Streams the `file` field into a temporary `.epub` file, bounded by the
/// configured size, then runs extraction on it. The temporary file is
/// removed when the handler returns.
async fn upload_epub(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let max_file_size = state.config().upload.max_file_size;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_file_size))?
    {
        if field.name() != Some("file") {
            tracing::debug!(field = ?field.name(), "Ignoring multipart field");
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if !is_epub_filename(&filename) {
            tracing::warn!(filename = %filename, "Rejected non-EPUB upload");
            return Err(AppError::BadRequest("File must be an EPUB file".to_string()));
        }

        let upload = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".epub")
            .tempfile()?;
        let mut out = tokio::fs::File::from_std(upload.reopen()?);

        let mut received: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error(e, max_file_size))?
        {
            received += chunk.len() as u64;
            if received > max_file_size {
                tracing::warn!(filename = %filename, limit = max_file_size, "Upload too large");
                return Err(too_large(max_file_size));
            }
            out.write_all(&chunk).await?;
        }
        out.flush().await?;
        drop(out);

        tracing::info!(filename = %filename, bytes = received, "Received EPUB upload");

        let text = state
            .extractor()
            .extract_text(upload.path())
            .await
            .map_err(|e| AppError::Processing(format!("Error processing EPUB: {}", e)))?;

        tracing::info!(filename = %filename, chars = text.len(), "EPUB processed");

        return Ok(Json(UploadResponse {
            filename,
            text,
            status: "success",
        }));
    }

    tracing::warn!("No file field found in multipart upload");
    Err(AppError::BadRequest(
        "No file provided. Use field name 'file'".to_string(),
    ))
}

fn is_epub_filename(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".epub")
}

fn too_large(max_file_size: u64) -> AppError {
    AppError::FileTooLarge(format!(
        "File too large (max {}MB)",
        max_file_size / (1024 * 1024)
    ))
}

fn multipart_error(error: MultipartError, max_file_size: u64) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_file_size)
    } else {
        tracing::error!("Failed to read multipart upload: {}", error);
        AppError::BadRequest(format!("Failed to read upload: {}", error))
    }
}

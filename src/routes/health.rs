//! Health check endpoints

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub ocr_engine: &'static str,
    pub ocr_available: bool,
    pub ocr_workers: usize,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "EPUB to Text API is running",
    })
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = state.engine().clone();
    // The probe may spawn a process
    let ocr_available = tokio::task::spawn_blocking(move || engine.is_available())
        .await
        .unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "epub-ocr-server",
        ocr_engine: state.engine().name(),
        ocr_available,
        ocr_workers: state.extractor().pool().size(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}

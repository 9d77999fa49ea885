//! EPUB OCR Server
//!
//! HTTP service that turns an uploaded EPUB into plain text, including text
//! recognized in its embedded images.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epub_ocr_server::config::Config;
use epub_ocr_server::extract::EpubExtractor;
use epub_ocr_server::ocr::{engine_from_config, OcrPool, OcrWorker};
use epub_ocr_server::routes;
use epub_ocr_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "epub_ocr_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Invalid configuration")?;

    tracing::info!("Starting EPUB OCR Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        engine = ?config.ocr.engine,
        workers = config.ocr.workers,
        language = %config.ocr.language,
        angle_classification = config.ocr.angle_classification,
        "OCR configuration"
    );

    // One engine for the whole process, shared by every worker
    let engine = engine_from_config(&config.ocr).context("Failed to initialize OCR engine")?;
    if engine.is_available() {
        tracing::info!("OCR engine '{}' is available", engine.name());
    } else {
        tracing::warn!(
            "OCR engine '{}' is not available; embedded images will contribute no text",
            engine.name()
        );
    }

    let pool = OcrPool::new(
        OcrWorker::new(engine, config.ocr.angle_classification),
        config.ocr.workers,
    );
    let app_state = AppState::new(config.clone(), EpubExtractor::new(pool));

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server.host, config.server.port))?;
    tracing::info!("EPUB OCR Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

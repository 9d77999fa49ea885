//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::extract::EpubExtractor;
use crate::ocr::OcrEngine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    extractor: EpubExtractor,
}

impl AppState {
    pub fn new(config: Config, extractor: EpubExtractor) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, extractor }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the extractor
    pub fn extractor(&self) -> &EpubExtractor {
        &self.inner.extractor
    }

    /// The process-wide OCR engine
    pub fn engine(&self) -> &Arc<dyn OcrEngine> {
        self.inner.extractor.pool().worker().engine()
    }
}

//! Bounded OCR worker pool
//!
//! Jobs run on tokio's blocking threads; a semaphore caps how many run at
//! once. Each submission gets its own handle resolving to the job's text.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::worker::OcrWorker;

#[derive(Clone)]
pub struct OcrPool {
    worker: Arc<OcrWorker>,
    permits: Arc<Semaphore>,
    size: usize,
}

impl OcrPool {
    /// Create a pool allowing `size` concurrent jobs (at least one)
    pub fn new(worker: OcrWorker, size: usize) -> Self {
        let size = size.max(1);
        Self {
            worker: Arc::new(worker),
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn worker(&self) -> &OcrWorker {
        &self.worker
    }

    /// Submit a blocking job.
    ///
    /// The job starts once a slot is free. A panicking job surfaces as a
    /// `JoinError` on the returned handle and does not affect other jobs.
    pub fn submit<F>(&self, job: F) -> JoinHandle<String>
    where
        F: FnOnce(&OcrWorker) -> String + Send + 'static,
    {
        let worker = self.worker.clone();
        let permits = self.permits.clone();

        tokio::spawn(async move {
            // Held until the blocking job returns
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::warn!("OCR pool closed, dropping job");
                    return String::new();
                }
            };

            match tokio::task::spawn_blocking(move || job(&worker)).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("OCR job aborted: {}", e);
                    String::new()
                }
            }
        })
    }
}

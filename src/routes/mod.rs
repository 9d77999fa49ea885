//! HTTP routes

pub mod health;
pub mod upload;

use axum::Router;

use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let max_file_size = state.config().upload.max_file_size;

    Router::new()
        .merge(health::router())
        .merge(upload::router(max_file_size))
        .with_state(state)
}

pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::optimizer::handlers;
use crate::state::AppState;

/// Résumé uploads can be multi-page PDFs.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/", get(health::root_handler))
        .route("/api/health", get(health::health_handler))
        .route("/api/test-ai", get(handlers::handle_test_ai))
        .route("/api/analyze", post(handlers::handle_analyze))
        .route(
            "/api/generate-cover-letter",
            post(handlers::handle_generate_cover_letter),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

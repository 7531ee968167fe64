use axum::Json;
use serde_json::{json, Value};

/// GET /api/health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resume-optimizer-api"
    }))
}

/// GET /api/
/// Service banner listing the public endpoints.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": format!("Resume Optimizer API v{}", env!("CARGO_PKG_VERSION")),
        "status": "healthy",
        "endpoints": {
            "health": "/api/health",
            "test_ai": "/api/test-ai",
            "analyze": "/api/analyze",
            "generate_cover_letter": "/api/generate-cover-letter"
        }
    }))
}

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractionError;
use crate::resilience::ErrorClassification;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// The AI call failed after the retry policy gave up.
    #[error("Upstream AI error: {0}")]
    Upstream(ErrorClassification),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
}

impl From<ErrorClassification> for AppError {
    fn from(classification: ErrorClassification) -> Self {
        AppError::Upstream(classification)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut retry_after: Option<u64> = None;

        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Extraction(e) => {
                tracing::warn!("Extraction error: {e}");
                (StatusCode::BAD_REQUEST, "EXTRACTION_ERROR", e.to_string())
            }
            AppError::Upstream(c) => {
                tracing::error!("AI call failed ({:?}): {}", c.kind, c.raw_detail);
                if c.retryable {
                    retry_after = c.suggested_delay_seconds;
                    (StatusCode::SERVICE_UNAVAILABLE, c.kind.code(), c.message.clone())
                } else {
                    // Rejected credentials are a server setup defect, not a client error.
                    (StatusCode::INTERNAL_SERVER_ERROR, c.kind.code(), c.message.clone())
                }
            }
            AppError::Timeout(secs) => {
                tracing::warn!("Request abandoned after {secs}s");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "REQUEST_TIMEOUT",
                    "The request took too long and was cancelled. Please try again.".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(secs) = retry_after {
            error["retry_after_seconds"] = json!(secs);
        }

        let mut response = (status, Json(json!({ "error": error }))).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::classifier::ErrorClassifier;

    #[test]
    fn test_retryable_failure_maps_to_503_with_retry_after() {
        let c = ErrorClassifier::new(5).classify("503 overloaded", 2);
        let response = AppError::Upstream(c).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "10");
    }

    #[test]
    fn test_auth_failure_maps_to_500_without_retry_after() {
        let c = ErrorClassifier::new(5).classify("401 Unauthorized", 1);
        let response = AppError::from(c).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }

    #[test]
    fn test_exhausted_retries_map_to_500() {
        let c = ErrorClassification::retries_exhausted("loop ended");
        let response = AppError::Upstream(c).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_is_400() {
        let response = AppError::Validation("job_description is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_timeout_is_504() {
        assert_eq!(
            AppError::Timeout(30).into_response().status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}

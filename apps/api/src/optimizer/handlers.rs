//! Axum route handlers for the Optimizer API.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::optimizer::input::{AnalysisInput, SourceInfo};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis_id: Uuid,
    pub analysis: Value,
    pub original_resume: String,
    pub job_description: String,
    pub source_info: SourceInfo,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CoverLetterResponse {
    pub cover_letter_id: Uuid,
    pub short_version: String,
    pub long_version: String,
    pub source_info: SourceInfo,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub success: bool,
    pub model: String,
    pub response: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/analyze
///
/// Analyzes a résumé against a job description. The whole retry sequence is
/// bounded by the service deadline; on expiry the in-flight call is dropped.
pub async fn handle_analyze(
    State(state): State<AppState>,
    input: AnalysisInput,
) -> Result<Json<AnalysisResponse>, AppError> {
    let prepared = input.prepare(&state.http).await?;

    let analysis = state
        .optimizer
        .analyze(&prepared.job_description, &prepared.resume_text)
        .await
        .ok_or_else(|| deadline_exceeded(&state))?
        .into_result()?;

    Ok(Json(AnalysisResponse {
        analysis_id: Uuid::new_v4(),
        analysis,
        original_resume: prepared.resume_text,
        job_description: prepared.job_description,
        source_info: prepared.source_info,
        created_at: Utc::now(),
    }))
}

/// POST /api/generate-cover-letter
///
/// Generates a short and a long cover letter for the same inputs as analysis.
pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    input: AnalysisInput,
) -> Result<Json<CoverLetterResponse>, AppError> {
    let prepared = input.prepare(&state.http).await?;

    let letters = state
        .optimizer
        .cover_letters(&prepared.job_description, &prepared.resume_text)
        .await
        .ok_or_else(|| deadline_exceeded(&state))?
        .into_result()?;

    Ok(Json(CoverLetterResponse {
        cover_letter_id: Uuid::new_v4(),
        short_version: letters.short_version,
        long_version: letters.long_version,
        source_info: prepared.source_info,
        created_at: Utc::now(),
    }))
}

/// GET /api/test-ai
///
/// Sends a one-line probe prompt to the configured model.
pub async fn handle_test_ai(
    State(state): State<AppState>,
) -> Result<Json<ProbeResponse>, AppError> {
    let response = state
        .optimizer
        .probe()
        .await
        .ok_or_else(|| deadline_exceeded(&state))?
        .into_result()?;

    Ok(Json(ProbeResponse {
        success: true,
        model: state.optimizer.model_name().to_string(),
        response,
    }))
}

fn deadline_exceeded(state: &AppState) -> AppError {
    AppError::Timeout(state.optimizer.deadline().as_secs())
}

//! Request input for the analyze / cover-letter endpoints.
//!
//! Accepts a JSON body, an urlencoded form, or multipart form data with an optional
//! résumé upload, so both the web client (JSON) and form posts reach the same handler.

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extraction::job_posting::{resolve_job_description, JobDescriptionSource};
use crate::extraction::{extract_resume_file, ResumeSource, UploadedFile};

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisRequest {
    pub job_description: Option<String>,
    pub resume_text: Option<String>,
}

/// Raw input as received. Nothing is validated until [`AnalysisInput::prepare`].
#[derive(Debug, Default)]
pub struct AnalysisInput {
    pub job_description: Option<String>,
    pub resume_text: Option<String>,
    pub resume_file: Option<UploadedFile>,
}

impl From<AnalysisRequest> for AnalysisInput {
    fn from(request: AnalysisRequest) -> Self {
        Self {
            job_description: request.job_description,
            resume_text: request.resume_text,
            resume_file: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SourceInfo {
    pub job_description: JobDescriptionSource,
    pub resume: ResumeSource,
}

/// Validated, text-only input ready for the model.
#[derive(Debug, Clone)]
pub struct PreparedInput {
    pub job_description: String,
    pub resume_text: String,
    pub source_info: SourceInfo,
}

#[async_trait]
impl<S> FromRequest<S> for AnalysisInput
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            return Self::from_multipart(multipart).await;
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(request) = Form::<AnalysisRequest>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            return Ok(request.into());
        }

        let Json(request) = Json::<AnalysisRequest>::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        Ok(request.into())
    }
}

impl AnalysisInput {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut input = AnalysisInput::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "job_description" => {
                    input.job_description = Some(
                        field
                            .text()
                            .await
                            .map_err(|e| AppError::Validation(e.body_text()))?,
                    );
                }
                "resume_text" => {
                    input.resume_text = Some(
                        field
                            .text()
                            .await
                            .map_err(|e| AppError::Validation(e.body_text()))?,
                    );
                }
                "resume_file" => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(e.body_text()))?;
                    // browsers send an empty part when no file was chosen
                    if !bytes.is_empty() {
                        input.resume_file = Some(UploadedFile {
                            filename,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                _ => {}
            }
        }

        Ok(input)
    }

    /// Validates the input and resolves it to text: extracts the uploaded résumé
    /// (which wins over `resume_text`) and fetches a URL-only job description.
    pub async fn prepare(self, http: &Client) -> Result<PreparedInput, AppError> {
        let job_description = self
            .job_description
            .filter(|jd| !jd.trim().is_empty())
            .ok_or_else(|| AppError::Validation("job_description is required".to_string()))?;

        let (resume_text, resume_source) = match (self.resume_file, self.resume_text) {
            (Some(file), _) => extract_resume_file(file).await?,
            (None, Some(text)) if !text.trim().is_empty() => {
                (text.trim().to_string(), ResumeSource::Text)
            }
            _ => {
                return Err(AppError::Validation(
                    "A resume is required: provide resume_text or upload resume_file".to_string(),
                ))
            }
        };

        let (job_description, job_description_source) =
            resolve_job_description(http, &job_description).await?;

        Ok(PreparedInput {
            job_description,
            resume_text,
            source_info: SourceInfo {
                job_description: job_description_source,
                resume: resume_source,
            },
        })
    }
}

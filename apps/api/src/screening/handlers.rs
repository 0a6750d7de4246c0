//! Axum route handlers for the Screening API.

use std::path::Path;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::screening::models::{RequirementSet, ScreeningReport};
use crate::screening::pipeline::{ResumeInput, ScreeningRequest};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RequirementsRequest {
    pub jd_text: String,
}

#[derive(Debug, Serialize)]
pub struct RequirementsResponse {
    pub requirements: RequirementSet,
}

#[derive(Debug, Deserialize)]
pub struct ScreeningBody {
    /// Defaults to a fresh UUID when omitted.
    #[serde(default)]
    pub resume_id: Option<String>,
    pub resume_text: String,
    pub jd_text: String,
    #[serde(default)]
    pub requirements: Option<RequirementSet>,
}

#[derive(Debug, Deserialize)]
pub struct BatchResume {
    #[serde(default)]
    pub resume_id: Option<String>,
    pub resume_text: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchBody {
    pub jd_text: String,
    #[serde(default)]
    pub requirements: Option<RequirementSet>,
    pub resumes: Vec<BatchResume>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<ScreeningReport>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/requirements
///
/// Structures a raw job description into per-category requirements.
/// Useful for previewing extraction and for reusing one set across many screenings.
pub async fn handle_structure_requirements(
    State(state): State<AppState>,
    Json(request): Json<RequirementsRequest>,
) -> Result<Json<RequirementsResponse>, AppError> {
    let requirements = state.pipeline.structure_requirements(&request.jd_text).await?;
    Ok(Json(RequirementsResponse { requirements }))
}

/// POST /api/v1/screenings
///
/// Scores one resume against one job description.
pub async fn handle_screen(
    State(state): State<AppState>,
    Json(body): Json<ScreeningBody>,
) -> Result<Json<ScreeningReport>, AppError> {
    let request = ScreeningRequest {
        resume_id: resume_id_or_new(body.resume_id),
        resume_text: body.resume_text,
        jd_text: body.jd_text,
        requirements: body.requirements,
    };
    let report = state.pipeline.score_resume(request).await?;
    Ok(Json(report))
}

/// POST /api/v1/screenings/batch
///
/// Scores many resumes against one job description. Results are best match first.
pub async fn handle_screen_batch(
    State(state): State<AppState>,
    Json(body): Json<BatchBody>,
) -> Result<Json<BatchResponse>, AppError> {
    check_batch_size(body.resumes.len(), state.config.max_batch_size)?;

    let resumes = body
        .resumes
        .into_iter()
        .map(|resume| ResumeInput {
            resume_id: resume_id_or_new(resume.resume_id),
            resume_text: resume.resume_text,
        })
        .collect();

    let results = state
        .pipeline
        .score_batch(&body.jd_text, body.requirements, resumes)
        .await?;
    Ok(Json(BatchResponse { results }))
}

/// POST /api/v1/screenings/upload
///
/// Multipart form: a `job_description` field (plain text, or a PDF file) and one or more
/// `resumes` PDF files. Each resume is identified by its file name without extension.
pub async fn handle_screen_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BatchResponse>, AppError> {
    let mut jd_text: Option<String> = None;
    let mut resumes: Vec<ResumeInput> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Malformed multipart body", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(&format!("Failed to read field '{name}'"), e))?;

        match name.as_str() {
            "job_description" => {
                let text = match &file_name {
                    Some(file_name) => extract_pdf_text(file_name, data).await?,
                    None => String::from_utf8(data.to_vec()).map_err(|_| {
                        AppError::Validation("job_description must be UTF-8 text".to_string())
                    })?,
                };
                jd_text = Some(text);
            }
            "resumes" => {
                let file_name = file_name.ok_or_else(|| {
                    AppError::Validation("each resume must be uploaded as a file".to_string())
                })?;
                let resume_id = file_stem(&file_name);
                let resume_text = extract_pdf_text(&file_name, data).await?;
                resumes.push(ResumeInput {
                    resume_id,
                    resume_text,
                });
            }
            other => {
                return Err(AppError::Validation(format!(
                    "Unexpected multipart field '{other}'"
                )))
            }
        }
    }

    let jd_text = jd_text
        .ok_or_else(|| AppError::Validation("job_description is required".to_string()))?;
    check_batch_size(resumes.len(), state.config.max_batch_size)?;

    info!("Received {} resume uploads", resumes.len());
    let results = state.pipeline.score_batch(&jd_text, None, resumes).await?;
    Ok(Json(BatchResponse { results }))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn resume_id_or_new(resume_id: Option<String>) -> String {
    resume_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn check_batch_size(count: usize, max: usize) -> Result<(), AppError> {
    if count == 0 {
        return Err(AppError::Validation(
            "at least one resume is required".to_string(),
        ));
    }
    if count > max {
        return Err(AppError::Validation(format!(
            "batch of {count} resumes exceeds the limit of {max}"
        )));
    }
    Ok(())
}

/// Body-limit failures surface as 413; everything else is a malformed request.
fn multipart_error(context: &str, error: MultipartError) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{context}: upload exceeds the size limit"))
    } else {
        AppError::Validation(format!("{context}: {}", error.body_text()))
    }
}

fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// PDF parsing is CPU-bound, so it runs on the blocking pool.
async fn extract_pdf_text(file_name: &str, data: Bytes) -> Result<String, AppError> {
    let label = file_name.to_string();
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!("spawn_blocking failed in PDF extraction: {e}"))
        })?
        .map_err(|e| AppError::Validation(format!("Could not read PDF '{label}': {e}")))
}

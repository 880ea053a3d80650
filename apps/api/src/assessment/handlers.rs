use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::assessment::analyzer::{assess_rfp, RfpAssessment};
use crate::assessment::questions::{generate_questions, ClarifyingQuestion};
use crate::errors::AppError;
use crate::extraction::{extract_text_async, truncate_chars, DocumentFormat};
use crate::state::AppState;
use crate::upload::{read_upload_form, UploadedDocument};

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<ClarifyingQuestion>,
}

/// POST /assess
/// Multipart: `file` (RFP as .docx, .pdf or text).
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn handle_assess(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<RfpAssessment>, AppError> {
    let form = read_upload_form(multipart).await?;
    let rfp_text = rfp_text(form.document, state.config.rfp_text_char_limit).await?;
    let assessment = assess_rfp(&rfp_text, state.llm.as_ref()).await?;
    Ok(Json(assessment))
}

/// POST /questions
/// Multipart: `file` (RFP), optional `company_url`.
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn handle_questions(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<QuestionsResponse>, AppError> {
    let form = read_upload_form(multipart).await?;
    let rfp_text = rfp_text(form.document, state.config.rfp_text_char_limit).await?;
    let website_text = state
        .context_aggregator()
        .website_text(form.company_url.as_deref())
        .await;

    let questions = generate_questions(&rfp_text, &website_text, state.llm.as_ref()).await?;
    Ok(Json(QuestionsResponse { questions }))
}

/// Extracted RFP text, capped at `limit` characters.
async fn rfp_text(upload: UploadedDocument, limit: usize) -> Result<String, AppError> {
    let format =
        DocumentFormat::detect(&upload.file_name, upload.content_type.as_deref(), &upload.bytes);
    let extracted = extract_text_async(upload.bytes, format).await;

    let text = extracted.text.trim();
    if text.is_empty() {
        return Err(AppError::InvalidDocument(format!(
            "no readable text in '{}'",
            upload.file_name
        )));
    }

    let (text, truncated) = truncate_chars(text, limit);
    info!(
        method = ?extracted.method,
        chars = text.chars().count(),
        truncated,
        "RFP text extracted from '{}'",
        upload.file_name
    );
    Ok(text.to_string())
}

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use tempfile::TempDir;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{DocumentFormat, DOCX_MIME};
use crate::state::AppState;
use crate::upload::read_upload_form;

pub const PLACEHOLDERS_TOTAL_HEADER: &str = "x-placeholders-total";
pub const PLACEHOLDERS_RESOLVED_HEADER: &str = "x-placeholders-resolved";
pub const DRIVE_FILE_ID_HEADER: &str = "x-drive-file-id";
pub const DRIVE_UPLOAD_STATUS_HEADER: &str = "x-drive-upload-status";

/// POST /draft
/// Multipart: `file` (.docx template), optional `company_url`.
/// Returns the filled document as an attachment named `Draft_<template name>`.
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn handle_draft(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_upload_form(multipart).await?;
    let upload = form.document;

    let format =
        DocumentFormat::detect(&upload.file_name, upload.content_type.as_deref(), &upload.bytes);
    if format != DocumentFormat::Docx {
        return Err(AppError::InvalidDocument(format!(
            "'{}' is not a .docx template",
            upload.file_name
        )));
    }

    // Removed on drop, whichever way this function exits.
    let workdir = TempDir::new().map_err(anyhow::Error::from)?;
    let input = workdir.path().join(&upload.file_name);
    let output_name = format!("Draft_{}", upload.file_name);
    let output = workdir.path().join(&output_name);
    tokio::fs::write(&input, &upload.bytes)
        .await
        .map_err(anyhow::Error::from)?;

    info!("Drafting from template '{}'", upload.file_name);
    let outcome = state
        .draft_pipeline()
        .run(&input, &output, form.company_url.as_deref())
        .await?;

    let bytes = tokio::fs::read(&output).await.map_err(anyhow::Error::from)?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(DOCX_MIME));
    headers.insert(
        header::CONTENT_DISPOSITION,
        header_value(&format!("attachment; filename=\"{output_name}\""))?,
    );
    headers.insert(
        HeaderName::from_static(PLACEHOLDERS_TOTAL_HEADER),
        HeaderValue::from(outcome.placeholders_total),
    );
    headers.insert(
        HeaderName::from_static(PLACEHOLDERS_RESOLVED_HEADER),
        HeaderValue::from(outcome.placeholders_resolved),
    );

    if let Some(drive) = &state.drive_output {
        match drive.upload_file(&output_name, bytes.clone(), DOCX_MIME).await {
            Ok(uploaded) => {
                headers.insert(
                    HeaderName::from_static(DRIVE_FILE_ID_HEADER),
                    header_value(&uploaded.id)?,
                );
                headers.insert(
                    HeaderName::from_static(DRIVE_UPLOAD_STATUS_HEADER),
                    HeaderValue::from_static("success"),
                );
            }
            Err(e) => {
                warn!("Draft upload to Google Drive failed: {e}");
                headers.insert(
                    HeaderName::from_static(DRIVE_UPLOAD_STATUS_HEADER),
                    HeaderValue::from_static("failed"),
                );
            }
        }
    }

    info!(
        "Draft complete: {}/{} placeholders resolved",
        outcome.placeholders_resolved, outcome.placeholders_total
    );
    Ok((headers, bytes).into_response())
}

fn header_value(value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid header value '{value}': {e}")))
}

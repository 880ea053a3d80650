//! Multipart form parsing shared by the upload routes.

use axum::extract::Multipart;
use bytes::Bytes;
use tracing::debug;

use crate::errors::AppError;

pub const FILE_FIELD: &str = "file";
pub const COMPANY_URL_FIELD: &str = "company_url";

#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug)]
pub struct UploadForm {
    pub document: UploadedDocument,
    pub company_url: Option<String>,
}

/// Reads the `file` part and the optional `company_url` text part. Unknown parts are skipped.
pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut document = None;
    let mut company_url = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some(FILE_FIELD) => {
                let file_name = sanitize_file_name(field.file_name().unwrap_or("upload"));
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read uploaded file: {e}")))?;
                document = Some(UploadedDocument {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            Some(COMPANY_URL_FIELD) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read company_url: {e}")))?;
                let text = text.trim();
                if !text.is_empty() {
                    company_url = Some(text.to_string());
                }
            }
            other => debug!("Ignoring multipart field {other:?}"),
        }
    }

    let document = document
        .ok_or_else(|| AppError::Validation(format!("Missing '{FILE_FIELD}' field")))?;
    if document.bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    Ok(UploadForm {
        document,
        company_url,
    })
}

/// Keeps the final path component and replaces anything outside a conservative
/// character set, so the name is safe both on disk and in a header.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_components_are_stripped() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(r"C:\Users\bid\RFP Template.docx"), "RFP Template.docx");
    }

    #[test]
    fn test_unsafe_characters_are_replaced() {
        assert_eq!(sanitize_file_name("Tender\"2024\".docx"), "Tender_2024_.docx");
        assert_eq!(sanitize_file_name("Überblick.docx"), "_berblick.docx");
    }

    #[test]
    fn test_empty_or_hidden_names_get_default() {
        assert_eq!(sanitize_file_name(""), "upload");
        assert_eq!(sanitize_file_name("..."), "upload");
        assert_eq!(sanitize_file_name(".env"), "env");
    }
}

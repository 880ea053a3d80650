//! Google Drive v3 REST client.
//!
//! Reads reference documents from the "Source Information" folder and uploads finished
//! drafts to the "RFP Output" folder. Folder IDs come from configuration or are found by
//! name at startup; every request carries a token from an `AccessTokenSource`.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use super::google_auth::AccessTokenSource;
use super::{ReferenceStore, StoreError};
use crate::extraction::{extract_text_async, DocumentFormat, DOCX_MIME, PDF_MIME, TEXT_MIME};
use crate::models::ReferenceDocument;

const DRIVE_BASE_URL: &str = "https://www.googleapis.com";
const GOOGLE_DOC_MIME: &str = "application/vnd.google-apps.document";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const LIST_PAGE_SIZE: &str = "100";

pub const PARENT_FOLDER_NAME: &str = "RFP AI Agent";
pub const SOURCE_FOLDER_NAME: &str = "Source Information";
pub const OUTPUT_FOLDER_NAME: &str = "RFP Output";

/// MIME types we know how to turn into text.
const SUPPORTED_MIME_TYPES: &[&str] = &[DOCX_MIME, TEXT_MIME, GOOGLE_DOC_MIME, PDF_MIME];

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    #[serde(default)]
    mime_type: String,
    modified_time: Option<DateTime<Utc>>,
}

/// Metadata of a file created by `upload_file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: String,
    pub name: Option<String>,
    pub web_view_link: Option<String>,
}

#[derive(Clone)]
pub struct GoogleDriveClient {
    client: Client,
    base_url: String,
    auth: Arc<dyn AccessTokenSource>,
    source_folder_id: Option<String>,
    output_folder_id: Option<String>,
}

impl GoogleDriveClient {
    pub fn new(
        auth: Arc<dyn AccessTokenSource>,
        source_folder_id: Option<String>,
        output_folder_id: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()?,
            base_url: DRIVE_BASE_URL.to_string(),
            auth,
            source_folder_id,
            output_folder_id,
        })
    }

    /// Points the client at a different host (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn has_source_folder(&self) -> bool {
        self.source_folder_id.is_some()
    }

    pub fn can_upload(&self) -> bool {
        self.output_folder_id.is_some()
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/drive/v3/{path}", self.base_url)
    }

    async fn token(&self) -> Result<String, StoreError> {
        self.auth.access_token().await
    }

    /// Fills in whichever folder IDs configuration left unset, looking them up by name
    /// under `parent_folder_id` (or the "RFP AI Agent" folder). A missing output folder
    /// is created. Failures are logged and leave the affected folder unset.
    pub async fn discover_folders(&mut self, parent_folder_id: Option<&str>) {
        if self.source_folder_id.is_some() && self.output_folder_id.is_some() {
            return;
        }
        if let Err(e) = self.try_discover_folders(parent_folder_id).await {
            error!("Error discovering Drive folders: {e}");
        }
    }

    async fn try_discover_folders(&mut self, parent_folder_id: Option<&str>) -> Result<(), StoreError> {
        let parent_id = match parent_folder_id {
            Some(id) => {
                info!("Using configured parent folder ID: {id}");
                id.to_string()
            }
            None => match self.find_folder_by_name(PARENT_FOLDER_NAME, None).await? {
                Some(folder) => {
                    info!("Found parent folder by name: {PARENT_FOLDER_NAME} (ID: {})", folder.id);
                    folder.id
                }
                None => {
                    warn!("Parent folder '{PARENT_FOLDER_NAME}' not found");
                    return Ok(());
                }
            },
        };

        if self.source_folder_id.is_none() {
            match self.find_folder_by_name(SOURCE_FOLDER_NAME, Some(&parent_id)).await? {
                Some(folder) => {
                    info!("Found source folder: {SOURCE_FOLDER_NAME} (ID: {})", folder.id);
                    self.source_folder_id = Some(folder.id);
                }
                None => warn!("Source folder '{SOURCE_FOLDER_NAME}' not found in parent"),
            }
        }

        if self.output_folder_id.is_none() {
            let id = match self.find_folder_by_name(OUTPUT_FOLDER_NAME, Some(&parent_id)).await? {
                Some(folder) => {
                    info!("Found output folder: {OUTPUT_FOLDER_NAME} (ID: {})", folder.id);
                    folder.id
                }
                None => {
                    warn!("Output folder '{OUTPUT_FOLDER_NAME}' not found in parent - creating it");
                    let id = self.create_folder(OUTPUT_FOLDER_NAME, &parent_id).await?;
                    info!("Created output folder: {OUTPUT_FOLDER_NAME} (ID: {id})");
                    id
                }
            };
            self.output_folder_id = Some(id);
        }
        Ok(())
    }

    /// First folder called `name`, optionally only within `parent_id`.
    async fn find_folder_by_name(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Option<DriveFile>, StoreError> {
        let mut query = format!(
            "name={} and mimeType='{FOLDER_MIME}' and trashed=false",
            query_literal(name)
        );
        if let Some(parent_id) = parent_id {
            query.push_str(&format!(" and {} in parents", query_literal(parent_id)));
        }

        let response = self
            .client
            .get(self.api_url("files"))
            .bearer_auth(self.token().await?)
            .query(&[
                ("q", query.as_str()),
                ("pageSize", "10"),
                ("fields", "files(id,name)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await?;

        let list: FileList = check_status(response).await?.json().await?;
        Ok(list.files.into_iter().next())
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String, StoreError> {
        let response = self
            .client
            .post(self.api_url("files"))
            .bearer_auth(self.token().await?)
            .query(&[("fields", "id"), ("supportsAllDrives", "true")])
            .json(&json!({
                "name": name,
                "mimeType": FOLDER_MIME,
                "parents": [parent_id]
            }))
            .send()
            .await?;
        let created: UploadedFile = check_status(response).await?.json().await?;
        Ok(created.id)
    }

    async fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFile>, StoreError> {
        let query = format!("{} in parents and trashed=false", query_literal(folder_id));
        let response = self
            .client
            .get(self.api_url("files"))
            .bearer_auth(self.token().await?)
            .query(&[
                ("q", query.as_str()),
                ("pageSize", LIST_PAGE_SIZE),
                ("fields", "files(id,name,mimeType,modifiedTime)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await?;

        let list: FileList = check_status(response).await?.json().await?;
        Ok(list.files)
    }

    /// Downloads a file and extracts its text. Google Docs are exported as plain text.
    async fn file_text(&self, file: &DriveFile) -> Result<String, StoreError> {
        if file.mime_type == GOOGLE_DOC_MIME {
            let response = self
                .client
                .get(self.api_url(&format!("files/{}/export", file.id)))
                .bearer_auth(self.token().await?)
                .query(&[("mimeType", TEXT_MIME)])
                .send()
                .await?;
            return Ok(check_status(response).await?.text().await?);
        }

        let response = self
            .client
            .get(self.api_url(&format!("files/{}", file.id)))
            .bearer_auth(self.token().await?)
            .query(&[("alt", "media"), ("supportsAllDrives", "true")])
            .send()
            .await?;
        let bytes: Bytes = check_status(response).await?.bytes().await?;

        let format = DocumentFormat::detect(&file.name, Some(&file.mime_type), &bytes);
        Ok(extract_text_async(bytes, format).await.text)
    }

    /// Uploads `bytes` into the output folder under `name`.
    ///
    /// Two calls: a media upload, then a metadata update that sets the name and
    /// moves the file into the output folder.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_file(
        &self,
        name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<UploadedFile, StoreError> {
        let folder_id = self
            .output_folder_id
            .as_deref()
            .ok_or(StoreError::NotConfigured("Google Drive output folder"))?;

        let response = self
            .client
            .post(format!("{}/upload/drive/v3/files", self.base_url))
            .bearer_auth(self.token().await?)
            .query(&[("uploadType", "media"), ("supportsAllDrives", "true")])
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(bytes)
            .send()
            .await?;
        let created: UploadedFile = check_status(response).await?.json().await?;

        let response = self
            .client
            .patch(self.api_url(&format!("files/{}", created.id)))
            .bearer_auth(self.token().await?)
            .query(&[
                ("addParents", folder_id),
                ("supportsAllDrives", "true"),
                ("fields", "id,name,webViewLink"),
            ])
            .json(&json!({ "name": name }))
            .send()
            .await?;
        let uploaded: UploadedFile = check_status(response).await?.json().await?;

        info!(
            "File uploaded to Drive output folder: {} (ID: {})",
            name, uploaded.id
        );
        Ok(uploaded)
    }
}

#[async_trait]
impl ReferenceStore for GoogleDriveClient {
    fn name(&self) -> &'static str {
        "google_drive"
    }

    async fn list_documents(&self) -> Result<Vec<ReferenceDocument>, StoreError> {
        let Some(folder_id) = self.source_folder_id.as_deref() else {
            warn!("Source folder ID not set - cannot retrieve documents");
            return Ok(Vec::new());
        };

        let files = self.list_files(folder_id).await?;
        let mut documents = Vec::new();

        for file in files
            .iter()
            .filter(|f| SUPPORTED_MIME_TYPES.contains(&f.mime_type.as_str()))
        {
            match self.file_text(file).await {
                Ok(content) if content.trim().is_empty() => {}
                Ok(content) => {
                    info!("Loaded source document: {}", file.name);
                    documents.push(ReferenceDocument {
                        id: file.id.clone(),
                        name: file.name.clone(),
                        content,
                        modified: file.modified_time,
                    });
                }
                Err(e) => warn!("Failed to read Drive file {} ({}): {e}", file.name, file.id),
            }
        }

        info!("Retrieved {} source documents from Google Drive", documents.len());
        Ok(documents)
    }
}

/// Quotes a value for a Drive `q` expression.
fn query_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

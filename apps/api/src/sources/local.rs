//! Reference documents from a local folder (stands in for a SharePoint document library).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::{ReferenceStore, StoreError};
use crate::extraction::{extract_text_async, DocumentFormat};
use crate::models::ReferenceDocument;

pub struct LocalFolderStore {
    root: PathBuf,
}

impl LocalFolderStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn load(&self, path: &Path, format: DocumentFormat) -> Result<ReferenceDocument, StoreError> {
        let metadata = tokio::fs::metadata(path).await?;
        let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
        let bytes = tokio::fs::read(path).await?;
        let extracted = extract_text_async(Bytes::from(bytes), format).await;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = path
            .strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();

        Ok(ReferenceDocument {
            id,
            name,
            content: extracted.text,
            modified,
        })
    }
}

#[async_trait]
impl ReferenceStore for LocalFolderStore {
    fn name(&self) -> &'static str {
        "local_folder"
    }

    async fn list_documents(&self) -> Result<Vec<ReferenceDocument>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();

        let mut documents = Vec::new();
        for path in paths {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let format = DocumentFormat::detect(&file_name, None, &[]);
            if format == DocumentFormat::Unknown {
                debug!("Skipping unsupported reference file {}", path.display());
                continue;
            }

            match self.load(&path, format).await {
                Ok(doc) if doc.content.trim().is_empty() => {
                    debug!("Skipping empty reference file {}", path.display());
                }
                Ok(doc) => {
                    info!("Loaded source document: {}", doc.name);
                    documents.push(doc);
                }
                Err(e) => warn!("Failed to read reference file {}: {e}", path.display()),
            }
        }

        info!(
            "Retrieved {} source documents from {}",
            documents.len(),
            self.root.display()
        );
        Ok(documents)
    }
}

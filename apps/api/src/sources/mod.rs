//! External content sources: the company website and the reference document store.
//!
//! Each source sits behind a narrow trait so the drafting pipeline can be built with
//! fakes in tests. `AppState` carries them as `Arc<dyn ...>`, chosen at startup from config.

pub mod drive;
pub mod google_auth;
pub mod local;
pub mod website;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::ReferenceDocument;

pub use drive::GoogleDriveClient;
pub use google_auth::{AccessTokenSource, ServiceAccountToken, StaticToken};
pub use local::LocalFolderStore;
pub use website::HttpWebsiteFetcher;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("website returned status {0}")]
    Status(u16),

    #[error("page contained no readable text")]
    Empty,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Google authentication failed: {0}")]
    Auth(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl From<gcp_auth::Error> for StoreError {
    fn from(e: gcp_auth::Error) -> Self {
        StoreError::Auth(e.to_string())
    }
}

/// Fetches a web page and reduces it to visible text.
#[async_trait]
pub trait WebsiteFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Lists reference documents with their content already extracted to text.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Short backend name for logs ("google_drive", "local_folder", ...).
    fn name(&self) -> &'static str;

    async fn list_documents(&self) -> Result<Vec<ReferenceDocument>, StoreError>;
}

/// Used when no store is configured. Absence of configuration is an empty list, not an error.
pub struct UnconfiguredStore;

#[async_trait]
impl ReferenceStore for UnconfiguredStore {
    fn name(&self) -> &'static str {
        "unconfigured"
    }

    async fn list_documents(&self) -> Result<Vec<ReferenceDocument>, StoreError> {
        Ok(Vec::new())
    }
}

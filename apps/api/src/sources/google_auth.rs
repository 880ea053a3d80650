//! Access tokens for the Google Drive API.
//!
//! Production uses service-account credentials from `GOOGLE_APPLICATION_CREDENTIALS`,
//! given either as the key JSON itself or as a path to the key file. `gcp_auth` caches
//! the token and refreshes it before expiry. A fixed bearer token can be configured
//! instead; it is used as-is and never refreshed.

use std::path::PathBuf;

use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};

use super::StoreError;

pub const DRIVE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/drive.readonly",
];

#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, StoreError>;
}

/// A bearer token supplied through configuration.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, StoreError> {
        Ok(self.0.clone())
    }
}

/// Where the service-account key comes from.
#[derive(Debug, PartialEq, Eq)]
pub enum CredentialsSource {
    Inline(String),
    File(PathBuf),
}

impl CredentialsSource {
    /// Values starting with `{` are key JSON; anything else is a file path.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with('{') {
            Self::Inline(raw.to_string())
        } else {
            Self::File(PathBuf::from(raw))
        }
    }
}

pub struct ServiceAccountToken {
    account: CustomServiceAccount,
}

impl ServiceAccountToken {
    pub fn from_credentials(raw: &str) -> Result<Self, StoreError> {
        let account = match CredentialsSource::parse(raw) {
            CredentialsSource::Inline(json) => CustomServiceAccount::from_json(&json)?,
            CredentialsSource::File(path) => {
                if !path.exists() {
                    return Err(StoreError::Auth(format!(
                        "credentials file not found: {}",
                        path.display()
                    )));
                }
                CustomServiceAccount::from_file(&path)?
            }
        };
        Ok(Self { account })
    }
}

#[async_trait]
impl AccessTokenSource for ServiceAccountToken {
    async fn access_token(&self) -> Result<String, StoreError> {
        let token = self.account.token(DRIVE_SCOPES).await?;
        Ok(token.as_str().to_string())
    }
}

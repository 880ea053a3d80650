use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,

    pub website_char_limit: usize,
    pub reference_doc_char_limit: usize,
    pub max_context_chars: usize,
    pub rfp_text_char_limit: usize,
    pub http_timeout_secs: u64,
    pub max_upload_bytes: usize,

    /// Local folder of reference documents. Used when Drive is not configured.
    pub source_docs_dir: Option<PathBuf>,
    /// Service-account key JSON, or a path to the key file.
    pub google_application_credentials: Option<String>,
    /// Fixed bearer token; takes precedence over the service account when set.
    pub google_drive_access_token: Option<String>,
    /// Folder holding "Source Information" and "RFP Output". Looked up by name when unset.
    pub google_drive_parent_folder_id: Option<String>,
    pub google_drive_source_folder_id: Option<String>,
    pub google_drive_output_folder_id: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),

            website_char_limit: parse_env("WEBSITE_CHAR_LIMIT", 10_000)?,
            reference_doc_char_limit: parse_env("REFERENCE_DOC_CHAR_LIMIT", 30_000)?,
            max_context_chars: parse_env("MAX_CONTEXT_CHARS", 100_000)?,
            rfp_text_char_limit: parse_env("RFP_TEXT_CHAR_LIMIT", 8_000)?,
            http_timeout_secs: parse_env("HTTP_TIMEOUT_SECS", 10)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 25 * 1024 * 1024)?,

            source_docs_dir: optional_env("SOURCE_DOCS_DIR").map(PathBuf::from),
            google_application_credentials: optional_env("GOOGLE_APPLICATION_CREDENTIALS"),
            google_drive_access_token: optional_env("GOOGLE_DRIVE_ACCESS_TOKEN"),
            google_drive_parent_folder_id: optional_env("GOOGLE_DRIVE_PARENT_FOLDER_ID"),
            google_drive_source_folder_id: optional_env("GOOGLE_DRIVE_SOURCE_FOLDER_ID"),
            google_drive_output_folder_id: optional_env("GOOGLE_DRIVE_OUTPUT_FOLDER_ID"),
        })
    }

    /// Drive is enabled when some form of credentials is present.
    pub fn drive_enabled(&self) -> bool {
        self.google_drive_access_token.is_some() || self.google_application_credentials.is_some()
    }

    /// Config with defaults and no external stores, for tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            anthropic_api_key: "test-key".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            website_char_limit: 10_000,
            reference_doc_char_limit: 30_000,
            max_context_chars: 100_000,
            rfp_text_char_limit: 8_000,
            http_timeout_secs: 10,
            max_upload_bytes: 25 * 1024 * 1024,
            source_docs_dir: None,
            google_application_credentials: None,
            google_drive_access_token: None,
            google_drive_parent_folder_id: None,
            google_drive_source_folder_id: None,
            google_drive_output_folder_id: None,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Set and non-blank, otherwise `None`.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

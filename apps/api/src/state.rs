use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::drafting::aggregator::{ContextAggregator, ContextLimits};
use crate::drafting::pipeline::DraftPipeline;
use crate::drafting::resolver::FieldResolver;
use crate::llm_client::{LlmClient, TextGenerator};
use crate::sources::{
    AccessTokenSource, GoogleDriveClient, HttpWebsiteFetcher, LocalFolderStore, ReferenceStore,
    ServiceAccountToken, StaticToken, UnconfiguredStore, WebsiteFetcher,
};

/// Shared application state injected into all route handlers via Axum extractors.
/// Only `Arc`ed clients and config; requests share no mutable state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm: Arc<dyn TextGenerator>,
    pub fetcher: Arc<dyn WebsiteFetcher>,
    pub store: Arc<dyn ReferenceStore>,
    /// Set when Drive has an output folder; finished drafts are uploaded there.
    pub drive_output: Option<Arc<GoogleDriveClient>>,
}

impl AppState {
    /// Production wiring: Anthropic client, HTTP fetcher, and the configured store.
    /// Drive folders missing from config are discovered here, before serving.
    pub async fn from_config(config: Config) -> Result<Self> {
        let llm = LlmClient::new(config.anthropic_api_key.clone())
            .context("failed to build LLM HTTP client")?;
        info!("LLM client initialized (model: {})", crate::llm_client::MODEL);

        let fetcher = HttpWebsiteFetcher::new(Duration::from_secs(config.http_timeout_secs))
            .context("failed to build website HTTP client")?;

        let drive = match drive_auth(&config) {
            Some(auth) => {
                let mut drive = GoogleDriveClient::new(
                    auth,
                    config.google_drive_source_folder_id.clone(),
                    config.google_drive_output_folder_id.clone(),
                )
                .context("failed to build Google Drive HTTP client")?;
                drive
                    .discover_folders(config.google_drive_parent_folder_id.as_deref())
                    .await;
                Some(Arc::new(drive))
            }
            None => None,
        };

        let store: Arc<dyn ReferenceStore> = match (&drive, &config.source_docs_dir) {
            (Some(drive), _) if drive.has_source_folder() => drive.clone(),
            (_, Some(dir)) => Arc::new(LocalFolderStore::new(dir.clone())),
            _ => Arc::new(UnconfiguredStore),
        };
        info!("Reference store: {}", store.name());

        let drive_output = drive.filter(|d| d.can_upload());
        if drive_output.is_some() {
            info!("Drafts will be uploaded to the Google Drive output folder");
        }

        Ok(Self {
            config,
            llm: Arc::new(llm),
            fetcher: Arc::new(fetcher),
            store,
            drive_output,
        })
    }

    pub fn context_aggregator(&self) -> ContextAggregator {
        ContextAggregator::new(
            self.fetcher.clone(),
            self.store.clone(),
            ContextLimits::from_config(&self.config),
        )
    }

    pub fn draft_pipeline(&self) -> DraftPipeline {
        DraftPipeline::new(
            self.context_aggregator(),
            FieldResolver::new(self.llm.clone()),
        )
    }
}

/// The static token wins when both are configured. Unusable credentials disable
/// Drive rather than failing startup.
fn drive_auth(config: &Config) -> Option<Arc<dyn AccessTokenSource>> {
    if !config.drive_enabled() {
        info!("GOOGLE_APPLICATION_CREDENTIALS not set - Google Drive integration disabled");
        return None;
    }
    if let Some(token) = &config.google_drive_access_token {
        info!("Google Drive: using the configured access token");
        return Some(Arc::new(StaticToken::new(token.clone())));
    }
    let credentials = config.google_application_credentials.as_deref()?;
    match ServiceAccountToken::from_credentials(credentials) {
        Ok(auth) => {
            info!("Google Drive client initialized with service-account credentials");
            Some(Arc::new(auth))
        }
        Err(e) => {
            warn!("Google Drive integration disabled: {e}");
            None
        }
    }
}

//! Context Aggregator — website text + reference documents + RFP excerpt → one bounded blob.
//!
//! Upstream failures degrade to an empty contribution and are logged; aggregation
//! itself never fails.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::extraction::truncate_chars;
use crate::models::ReferenceDocument;
use crate::sources::{ReferenceStore, WebsiteFetcher};

pub const TRUNCATION_MARKER: &str = "...[truncated]";
pub const REDACTION_MARKER: &str =
    "<<REDACTED: document withheld because it appears to contain credentials>>";

/// PEM private keys of any flavour, PuTTY keys, and service-account JSON key files.
static CREDENTIAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)-----BEGIN [A-Z0-9 ]*PRIVATE KEY(?: BLOCK)?-----|PuTTY-User-Key-File|"private_key"\s*:"#,
    )
    .expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextLimits {
    pub website_chars: usize,
    pub reference_doc_chars: usize,
    pub max_context_chars: usize,
    pub rfp_chars: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            website_chars: 10_000,
            reference_doc_chars: 30_000,
            max_context_chars: 100_000,
            rfp_chars: 8_000,
        }
    }
}

impl ContextLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            website_chars: config.website_char_limit,
            reference_doc_chars: config.reference_doc_char_limit,
            max_context_chars: config.max_context_chars,
            rfp_chars: config.rfp_text_char_limit,
        }
    }
}

/// The assembled context blob plus what went into it.
#[derive(Debug, Clone, Default)]
pub struct AggregatedContext {
    pub text: String,
    pub website_used: bool,
    pub reference_count: usize,
}

impl AggregatedContext {
    /// Builds the blob from already-fetched material.
    pub fn assemble(
        website: &str,
        references: &[ReferenceDocument],
        rfp_text: &str,
        limits: &ContextLimits,
    ) -> Self {
        let mut sections = Vec::new();

        let website = website.trim();
        if !website.is_empty() {
            let (text, _) = truncate_chars(website, limits.website_chars);
            sections.push(format!("=== COMPANY WEBSITE ===\n{text}"));
        }

        let reference_block = format_reference_documents(references, limits.reference_doc_chars);
        if !reference_block.is_empty() {
            sections.push(format!("=== REFERENCE DOCUMENTS ===\n{reference_block}"));
        }

        let rfp_text = rfp_text.trim();
        if !rfp_text.is_empty() {
            let (text, _) = truncate_chars(rfp_text, limits.rfp_chars);
            sections.push(format!("=== RFP DOCUMENT EXCERPT ===\n{text}"));
        }

        let joined = sections.join("\n\n");
        let text = match truncate_chars(&joined, limits.max_context_chars) {
            (kept, true) => format!("{kept}\n{TRUNCATION_MARKER}"),
            (kept, false) => kept.to_string(),
        };

        Self {
            text,
            website_used: !website.is_empty(),
            reference_count: references.len(),
        }
    }

    /// Website or reference documents present. The RFP excerpt alone is not source
    /// material: it cannot answer questions about the responding company.
    pub fn has_source_material(&self) -> bool {
        self.website_used || self.reference_count > 0
    }
}

/// Concatenates documents under a per-document header naming the source.
pub fn format_reference_documents(documents: &[ReferenceDocument], per_doc_chars: usize) -> String {
    documents
        .iter()
        .map(|doc| {
            let modified = doc
                .modified
                .map(|m| m.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let content = redact_credentials(&doc.content);
            let body = match truncate_chars(content.trim(), per_doc_chars) {
                (kept, true) => format!("{kept}{TRUNCATION_MARKER}"),
                (kept, false) => kept.to_string(),
            };
            format!("--- Document: {} (modified {modified}) ---\n{body}", doc.name)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Replaces the whole content when it carries anything that looks like a credential.
pub fn redact_credentials(content: &str) -> &str {
    if CREDENTIAL_RE.is_match(content) {
        REDACTION_MARKER
    } else {
        content
    }
}

pub struct ContextAggregator {
    fetcher: Arc<dyn WebsiteFetcher>,
    store: Arc<dyn ReferenceStore>,
    limits: ContextLimits,
}

impl ContextAggregator {
    pub fn new(
        fetcher: Arc<dyn WebsiteFetcher>,
        store: Arc<dyn ReferenceStore>,
        limits: ContextLimits,
    ) -> Self {
        Self {
            fetcher,
            store,
            limits,
        }
    }

    /// Visible website text, or empty when no URL was given or the fetch failed.
    pub async fn website_text(&self, company_url: Option<&str>) -> String {
        let Some(url) = company_url.map(str::trim).filter(|u| !u.is_empty()) else {
            return String::new();
        };
        match self.fetcher.fetch(url).await {
            Ok(text) => {
                let (text, truncated) = truncate_chars(&text, self.limits.website_chars);
                info!(
                    "Fetched company website {url}: {} chars{}",
                    text.chars().count(),
                    if truncated { " (truncated)" } else { "" }
                );
                text.to_string()
            }
            Err(e) => {
                warn!("Error fetching website content from {url}: {e}");
                String::new()
            }
        }
    }

    pub async fn reference_documents(&self) -> Vec<ReferenceDocument> {
        match self.store.list_documents().await {
            Ok(documents) => documents,
            Err(e) => {
                warn!(
                    "Reference store '{}' unavailable, continuing without it: {e}",
                    self.store.name()
                );
                Vec::new()
            }
        }
    }

    #[instrument(skip(self, rfp_text))]
    pub async fn aggregate(&self, company_url: Option<&str>, rfp_text: &str) -> AggregatedContext {
        let website = self.website_text(company_url).await;
        let references = self.reference_documents().await;
        let context = AggregatedContext::assemble(&website, &references, rfp_text, &self.limits);
        info!(
            website_used = context.website_used,
            reference_count = context.reference_count,
            chars = context.text.chars().count(),
            "Context aggregated"
        );
        context
    }
}

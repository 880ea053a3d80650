//! Drafting pipeline: Scanner → Aggregator → Resolver → Rewriter, strictly sequential.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Serialize;
use tracing::{info, instrument};

use crate::docx::DocxTemplate;
use crate::drafting::aggregator::ContextAggregator;
use crate::drafting::resolver::FieldResolver;
use crate::drafting::rewriter::{rewrite_document, RewriteStats};
use crate::drafting::scanner::scan_placeholders;
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct DraftOutcome {
    pub placeholders_total: usize,
    pub placeholders_resolved: usize,
    pub website_used: bool,
    pub reference_count: usize,
    pub rewrite: RewriteStats,
}

pub struct DraftPipeline {
    aggregator: ContextAggregator,
    resolver: FieldResolver,
}

impl DraftPipeline {
    pub fn new(aggregator: ContextAggregator, resolver: FieldResolver) -> Self {
        Self {
            aggregator,
            resolver,
        }
    }

    /// Fills the template at `input` and writes the draft to `output`.
    ///
    /// Fails only on input-format or filesystem errors; every upstream problem
    /// degrades to fallback markers in the produced document.
    #[instrument(skip(self), fields(template = %input.display()))]
    pub async fn run(
        &self,
        input: &Path,
        output: &Path,
        company_url: Option<&str>,
    ) -> Result<DraftOutcome, AppError> {
        let path = input.to_path_buf();
        let template = tokio::task::spawn_blocking(move || DocxTemplate::open(&path))
            .await
            .context("template parsing task failed")??;

        let mut document = template.document().clone();
        let placeholders = scan_placeholders(&document);
        info!("Found {} distinct placeholders", placeholders.len());

        let rfp_text = document.plain_text();
        let context = self.aggregator.aggregate(company_url, &rfp_text).await;
        let resolutions = self.resolver.resolve(&placeholders, &context).await;
        debug_assert_eq!(resolutions.keys(), placeholders);

        let rewrite = rewrite_document(&mut document, &resolutions);
        info!(
            "Rewrote {} paragraphs ({} replacements)",
            rewrite.paragraphs_changed, rewrite.replacements
        );

        let target: PathBuf = output.to_path_buf();
        tokio::task::spawn_blocking(move || template.save(&document, &target))
            .await
            .context("draft rendering task failed")??;

        Ok(DraftOutcome {
            placeholders_total: placeholders.len(),
            placeholders_resolved: resolutions.filled_count(),
            website_used: context.website_used,
            reference_count: context.reference_count,
            rewrite,
        })
    }
}

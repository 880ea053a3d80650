//! Document Rewriter — substitutes `[name]` tokens in a single pass per paragraph.
//!
//! Inserted text is never re-scanned, so a value that itself looks like `[Other]`
//! stays literal and the result does not depend on map iteration order.

use regex::Captures;
use serde::Serialize;

use crate::docx::Document;
use crate::drafting::resolution::ResolutionMap;
use crate::drafting::scanner::PLACEHOLDER_RE;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    pub paragraphs_changed: usize,
    pub replacements: usize,
}

/// Replaces every token whose name is in `resolutions`. Unknown tokens are left as-is.
pub fn rewrite_text(text: &str, resolutions: &ResolutionMap) -> (String, usize) {
    let mut count = 0;
    let rewritten = PLACEHOLDER_RE.replace_all(text, |caps: &Captures| {
        match resolutions.replacement(&caps[1]) {
            Some(value) => {
                count += 1;
                value
            }
            None => caps[0].to_string(),
        }
    });
    (rewritten.into_owned(), count)
}

pub fn rewrite_document(document: &mut Document, resolutions: &ResolutionMap) -> RewriteStats {
    let mut stats = RewriteStats::default();
    if resolutions.is_empty() {
        return stats;
    }

    for paragraph in document.paragraphs_mut() {
        let (rewritten, count) = rewrite_text(&paragraph.text, resolutions);
        if count == 0 {
            continue;
        }
        stats.replacements += count;
        if rewritten != paragraph.text {
            paragraph.text = rewritten;
            stats.paragraphs_changed += 1;
        }
    }
    stats
}

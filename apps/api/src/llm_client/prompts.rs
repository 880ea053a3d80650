// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static TEMPLATE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("valid regex"));

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Common instruction appended to prompts that draw on company material.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Use only facts stated in the provided source material. \
    Do NOT infer, interpolate, or invent details such as names, numbers, dates or addresses. \
    If the source material does not support a value, say so instead of guessing.";

/// Substitutes `{token}` slots in one pass over the template.
///
/// Inserted values are never scanned again, so a value that itself contains `{context}`
/// or `{rfp_text}` lands verbatim. Tokens without a value are left as written.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    TEMPLATE_TOKEN_RE
        .replace_all(template, |caps: &Captures| {
            values
                .iter()
                .find(|(token, _)| *token == &caps[1])
                .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
        })
        .into_owned()
}

//! Batch Field Resolver — one generation call for every placeholder, parsed tolerantly.
//!
//! The output map always has exactly the input placeholder set as keys. Anything that
//! goes wrong (no context, service failure, unparseable reply, missing key) becomes a
//! per-field fallback marker instead of an error.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::docx::xml_safe_text;
use crate::drafting::aggregator::AggregatedContext;
use crate::drafting::prompts::{FIELD_FILL_PROMPT_TEMPLATE, FIELD_FILL_SYSTEM};
use crate::drafting::resolution::{FallbackReason, FieldValue, ResolutionMap};
use crate::drafting::scanner::bracketed;
use crate::llm_client::prompts::{fill_template, GROUNDING_INSTRUCTION};
use crate::llm_client::{extract_json_object, TextGenerator};

/// Sentinel the prompt asks the model to use for unknown fields.
const MODEL_NOT_FOUND: &str = "NOT FOUND";

pub struct FieldResolver {
    generator: Arc<dyn TextGenerator>,
}

impl FieldResolver {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn resolve(
        &self,
        placeholders: &BTreeSet<String>,
        context: &AggregatedContext,
    ) -> ResolutionMap {
        if placeholders.is_empty() {
            return ResolutionMap::default();
        }

        if !context.has_source_material() {
            info!(
                "No website or reference documents available; marking {} fields as unsourced",
                placeholders.len()
            );
            return ResolutionMap::all_fallback(placeholders, FallbackReason::NoSourceInformation);
        }

        let prompt = build_prompt(placeholders, &context.text);
        let map = match self.generator.generate(&prompt, FIELD_FILL_SYSTEM).await {
            Ok(raw) => parse_response(placeholders, &raw),
            Err(e) => {
                warn!("Field generation failed: {e}");
                ResolutionMap::all_fallback(placeholders, FallbackReason::GenerationFailed)
            }
        };

        info!(
            "Resolved {}/{} placeholders from source material",
            map.filled_count(),
            map.len()
        );
        map
    }
}

pub fn build_prompt(placeholders: &BTreeSet<String>, context: &str) -> String {
    let placeholders_json = json!(placeholders).to_string();
    fill_template(
        FIELD_FILL_PROMPT_TEMPLATE,
        &[
            ("placeholders_json", &placeholders_json),
            ("grounding_instruction", GROUNDING_INSTRUCTION),
            ("context", context),
        ],
    )
}

/// Tolerant parse of a free-form reply into a complete ResolutionMap.
pub fn parse_response(placeholders: &BTreeSet<String>, raw: &str) -> ResolutionMap {
    let Some(span) = extract_json_object(raw) else {
        warn!("Generation response contained no JSON object");
        return ResolutionMap::all_fallback(placeholders, FallbackReason::NoJsonInResponse);
    };

    let object = match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(object)) => object,
        Ok(other) => {
            warn!("Generation response JSON was not an object: {}", type_name(&other));
            return ResolutionMap::all_fallback(placeholders, FallbackReason::InvalidJson);
        }
        Err(e) => {
            warn!("Generation response JSON did not parse: {e}");
            return ResolutionMap::all_fallback(placeholders, FallbackReason::InvalidJson);
        }
    };

    placeholders
        .iter()
        .map(|name| {
            let value = [name.clone(), bracketed(name)]
                .iter()
                .find_map(|key| object.get(key).and_then(coerce_value));
            let field = match value {
                Some(text) => FieldValue::Filled(text),
                None => FieldValue::Fallback(FallbackReason::NotFound),
            };
            (name.clone(), field)
        })
        .collect()
}

/// Turns a JSON value into replacement text. `None` means "no usable value".
fn coerce_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => xml_safe_text(s).trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(coerce_value)
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(_) => value.to_string(),
    };

    if text.is_empty() || text.eq_ignore_ascii_case(MODEL_NOT_FOUND) {
        None
    } else {
        Some(text)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

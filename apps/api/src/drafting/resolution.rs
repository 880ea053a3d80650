//! ResolutionMap — placeholder name → replacement text or explicit fallback marker.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// Why a placeholder could not be filled with real content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// No website and no reference documents were available.
    NoSourceInformation,
    /// The response parsed but had no usable value for this key.
    NotFound,
    /// The response contained no `{...}` span.
    NoJsonInResponse,
    /// The `{...}` span was not a valid JSON object.
    InvalidJson,
    /// The generation service call failed (timeout, auth, HTTP).
    GenerationFailed,
}

impl FallbackReason {
    fn describe(&self) -> &'static str {
        match self {
            Self::NoSourceInformation => "no source information available",
            Self::NotFound => "not found in source material",
            Self::NoJsonInResponse => "generation service returned no JSON object",
            Self::InvalidJson => "generation service response was not valid JSON",
            Self::GenerationFailed => "generation service unavailable",
        }
    }

    /// Marker text written into the document. Angle brackets keep it from ever
    /// being scanned as a placeholder.
    pub fn marker(&self, name: &str) -> String {
        format!("<<{name}: {}>>", self.describe())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Filled(String),
    Fallback(FallbackReason),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionMap {
    entries: BTreeMap<String, FieldValue>,
}

impl ResolutionMap {
    /// Every placeholder mapped to the same fallback.
    pub fn all_fallback(placeholders: &BTreeSet<String>, reason: FallbackReason) -> Self {
        placeholders
            .iter()
            .map(|name| (name.clone(), FieldValue::Fallback(reason.clone())))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.get(name)
    }

    /// Text to substitute for `name`, with fallbacks rendered as markers.
    pub fn replacement(&self, name: &str) -> Option<String> {
        self.entries.get(name).map(|value| match value {
            FieldValue::Filled(text) => text.clone(),
            FieldValue::Fallback(reason) => reason.marker(name),
        })
    }

    pub fn keys(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn filled_count(&self) -> usize {
        self.entries
            .values()
            .filter(|v| matches!(v, FieldValue::Filled(_)))
            .count()
    }

    pub fn fallback_count(&self) -> usize {
        self.len() - self.filled_count()
    }
}

impl FromIterator<(String, FieldValue)> for ResolutionMap {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A prior document pulled from the reference store and used as grounding context.
/// Read-only once loaded; content is already reduced to plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDocument {
    pub id: String,
    pub name: String,
    pub content: String,
    pub modified: Option<DateTime<Utc>>,
}

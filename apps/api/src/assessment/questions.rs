//! Question Generator — clarifying questions to put to the RFP issuer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::assessment::prompts::{
    COMPANY_CONTEXT_TEMPLATE, QUESTIONS_PROMPT_TEMPLATE, QUESTIONS_SYSTEM,
};
use crate::errors::AppError;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{extract_json_array, LlmError, TextGenerator};

/// Sorted High first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" | "critical" | "urgent" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarifyingQuestion {
    pub question: String,
    pub priority: Priority,
    pub category: String,
}

pub async fn generate_questions(
    rfp_text: &str,
    website_text: &str,
    generator: &dyn TextGenerator,
) -> Result<Vec<ClarifyingQuestion>, AppError> {
    let prompt = build_prompt(rfp_text, website_text);
    let raw = generator
        .generate(&prompt, QUESTIONS_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Question generation failed: {e}")))?;

    let questions = parse_questions(&raw)
        .map_err(|e| AppError::Llm(format!("Question generation response unusable: {e}")))?;
    info!("Generated {} clarifying questions", questions.len());
    Ok(questions)
}

pub fn build_prompt(rfp_text: &str, website_text: &str) -> String {
    let company_context = if website_text.trim().is_empty() {
        String::new()
    } else {
        fill_template(COMPANY_CONTEXT_TEMPLATE, &[("website_text", website_text.trim())])
    };
    fill_template(
        QUESTIONS_PROMPT_TEMPLATE,
        &[("company_context", &company_context), ("rfp_text", rfp_text)],
    )
}

pub fn parse_questions(raw: &str) -> Result<Vec<ClarifyingQuestion>, LlmError> {
    let span = extract_json_array(raw).ok_or(LlmError::NoJson("array"))?;
    let items: Vec<Value> = serde_json::from_str(span)?;

    let mut questions: Vec<ClarifyingQuestion> = items
        .iter()
        .filter_map(|item| {
            let question = item.get("question")?.as_str()?.trim();
            if question.is_empty() {
                return None;
            }
            let priority = item
                .get("priority")
                .and_then(Value::as_str)
                .map(Priority::parse)
                .unwrap_or(Priority::Medium);
            let category = item
                .get("category")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or("General");
            Some(ClarifyingQuestion {
                question: question.to_string(),
                priority,
                category: category.to_string(),
            })
        })
        .collect();

    // Stable: model order is kept within a priority.
    questions.sort_by_key(|q| q.priority);
    Ok(questions)
}

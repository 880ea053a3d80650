//! RFP Analyzer — pursue / no-pursue scoring of an RFP.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::assessment::prompts::{ASSESS_PROMPT_TEMPLATE, ASSESS_SYSTEM};
use crate::errors::AppError;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{extract_json_object, LlmError, TextGenerator};

/// Overall score at or above which an RFP is worth pursuing.
pub const PURSUE_THRESHOLD: u8 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Pursue,
    #[serde(rename = "No Pursue")]
    NoPursue,
}

impl Recommendation {
    pub fn from_score(score: u8) -> Self {
        if score >= PURSUE_THRESHOLD {
            Self::Pursue
        } else {
            Self::NoPursue
        }
    }

    /// Accepts the spellings models tend to produce ("No-Pursue", "do not pursue", "GO").
    fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();
        match normalized.as_str() {
            "pursue" | "go" | "bid" | "yes" => Some(Self::Pursue),
            "nopursue" | "donotpursue" | "dontpursue" | "notpursue" | "nogo" | "nobid" | "no" => {
                Some(Self::NoPursue)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaScores {
    pub strategy: u8,
    pub offerings: u8,
    pub resources: u8,
    pub risks: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfpAssessment {
    pub score: u8,
    pub recommendation: Recommendation,
    pub criteria_scores: CriteriaScores,
    pub reasoning: String,
}

/// What the model sends back before normalisation. Every field is optional and
/// loosely typed; scores may arrive as numbers or numeric strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAssessment {
    score: Value,
    recommendation: Option<String>,
    criteria_scores: Option<RawCriteria>,
    reasoning: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCriteria {
    strategy: Value,
    offerings: Value,
    resources: Value,
    risks: Value,
}

pub async fn assess_rfp(
    rfp_text: &str,
    generator: &dyn TextGenerator,
) -> Result<RfpAssessment, AppError> {
    let prompt = fill_template(ASSESS_PROMPT_TEMPLATE, &[("rfp_text", rfp_text)]);
    let raw = generator
        .generate(&prompt, ASSESS_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("RFP assessment failed: {e}")))?;

    let assessment = parse_assessment(&raw)
        .map_err(|e| AppError::Llm(format!("RFP assessment response unusable: {e}")))?;
    info!(
        score = assessment.score,
        recommendation = ?assessment.recommendation,
        "RFP assessed"
    );
    Ok(assessment)
}

pub fn parse_assessment(raw: &str) -> Result<RfpAssessment, LlmError> {
    let span = extract_json_object(raw).ok_or(LlmError::NoJson("object"))?;
    let parsed: RawAssessment = serde_json::from_str(span)?;

    let criteria = parsed.criteria_scores.unwrap_or_default();
    let criteria_scores = CriteriaScores {
        strategy: score_value(&criteria.strategy).unwrap_or(0),
        offerings: score_value(&criteria.offerings).unwrap_or(0),
        resources: score_value(&criteria.resources).unwrap_or(0),
        risks: score_value(&criteria.risks).unwrap_or(0),
    };

    // An overall score is required; fall back to the criteria mean only when the
    // model sent criteria.
    let score = match score_value(&parsed.score) {
        Some(score) => score,
        None if criteria_scores != CriteriaScores::default() => {
            let c = &criteria_scores;
            let sum = u16::from(c.strategy) + u16::from(c.offerings) + u16::from(c.resources)
                + u16::from(c.risks);
            ((sum + 2) / 4) as u8
        }
        None => return Err(LlmError::MissingField("score")),
    };

    let recommendation = match parsed.recommendation.as_deref().and_then(Recommendation::parse) {
        Some(recommendation) => recommendation,
        None => {
            warn!(
                "Unrecognised recommendation {:?}; deriving from score {score}",
                parsed.recommendation
            );
            Recommendation::from_score(score)
        }
    };

    Ok(RfpAssessment {
        score,
        recommendation,
        criteria_scores,
        reasoning: parsed.reasoning.unwrap_or_default().trim().to_string(),
    })
}

/// Number or numeric string, clamped to 0–100.
fn score_value(value: &Value) -> Option<u8> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if number.is_nan() {
        return None;
    }
    Some(number.round().clamp(0.0, 100.0) as u8)
}

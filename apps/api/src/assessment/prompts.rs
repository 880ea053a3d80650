// LLM prompt templates for the assessment module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for pursue/no-pursue scoring.
pub const ASSESS_SYSTEM: &str = "\
You are a senior bid manager deciding whether a consulting firm should respond to an RFP. \
You MUST respond with valid JSON only. \
Do NOT include any text outside the JSON object. \
Do NOT use markdown code fences.";

/// Assessment prompt. Replace `{rfp_text}` before sending.
pub const ASSESS_PROMPT_TEMPLATE: &str = r#"Assess the following RFP for a pursue / no-pursue decision.

Score each criterion from 0 to 100:
- strategy: alignment with the firm's strategic direction and target clients
- offerings: fit with the services the firm already delivers
- resources: availability of the people and capacity the work demands
- risks: how manageable the commercial, compliance and delivery risks are (100 = low risk)

Return a JSON object with this EXACT schema:
{
  "score": 88,
  "recommendation": "Pursue",
  "criteria_scores": {"strategy": 90, "offerings": 95, "resources": 80, "risks": 85},
  "reasoning": "Two or three sentences explaining the decision."
}

"recommendation" must be exactly "Pursue" or "No Pursue". "score" is the overall score.

RFP TEXT:
{rfp_text}"#;

/// System prompt for clarifying questions.
pub const QUESTIONS_SYSTEM: &str = "\
You are an experienced bid manager preparing clarifying questions for an RFP issuer. \
You MUST respond with a JSON array only. \
Do NOT include any text outside the JSON array. \
Do NOT use markdown code fences.";

/// Questions prompt. Replace `{company_context}` and `{rfp_text}` before sending.
pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"Read the following RFP and list the clarifying questions we should ask the client.

Focus on:
- Scope and success criteria
- Evaluation weighting
- Timeline, budget, resources
- Constraints

{company_context}

Return a JSON array of objects with this EXACT schema:
[
  {"question": "Can you clarify the specific KPIs for success?", "priority": "High", "category": "Scope"}
]

"priority" must be one of "High", "Medium", "Low".

RFP TEXT:
{rfp_text}"#;

/// Inserted into the questions prompt when the company website was fetched.
pub const COMPANY_CONTEXT_TEMPLATE: &str = r#"Our company's capabilities, taken from our website, are below. Prefer questions
whose answers would change how we position these capabilities.

COMPANY WEBSITE:
{website_text}"#;

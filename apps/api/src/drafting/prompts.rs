// LLM prompt templates for the drafting module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for batch field filling — enforces a flat JSON object.
pub const FIELD_FILL_SYSTEM: &str = "\
You are an expert bid writer completing a proposal response template on behalf of a company. \
You fill template fields strictly from the company's own source material. \
You MUST respond with a single flat JSON object only. \
Do NOT include any text outside the JSON object. \
Do NOT use markdown code fences.";

/// Batch field-fill prompt. Replace `{placeholders_json}`, `{grounding_instruction}`
/// and `{context}` before sending.
pub const FIELD_FILL_PROMPT_TEMPLATE: &str = r#"The proposal template contains the following fields, written in square brackets in the document:

{placeholders_json}

Using ONLY the source material below, work out the text that should replace each field.

Rules:
- Return ONE flat JSON object. Keys are the field names exactly as listed above (without brackets). Values are plain strings.
- Include every field as a key, even when you cannot fill it.
- Fields that belong together (for example a table row holding a Name, Role and Address) must describe the same person, project or organisation.
- Keep values as concise as the field implies: a name is a name, an ABN is a number, a summary may be a short paragraph.
- If the source material does not contain the information for a field, use the value "NOT FOUND".
- Never return square brackets inside a value.

{grounding_instruction}

SOURCE MATERIAL:
{context}

Return the JSON object now."#;

// RFP triage: pursue/no-pursue scoring and clarifying questions for the issuer.
// All LLM calls go through llm_client::TextGenerator.

pub mod analyzer;
pub mod handlers;
pub mod prompts;
pub mod questions;

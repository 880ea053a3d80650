// Proposal drafting: fill a .docx template's [Placeholder] fields from company sources.
// Flow: scanner → aggregator → resolver → rewriter, strictly sequential per request.
// All LLM calls go through llm_client::TextGenerator — no direct API calls here.

pub mod aggregator;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod resolution;
pub mod resolver;
pub mod rewriter;
pub mod scanner;

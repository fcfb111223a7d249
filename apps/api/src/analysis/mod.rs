// Grievance analysis: prompt → ordered model fallback → normalized report.
// All provider calls go through llm_client::CompletionProvider.

pub mod handlers;
pub mod models;
pub mod prompts;
pub mod response;
pub mod service;

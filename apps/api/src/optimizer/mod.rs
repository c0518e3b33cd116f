// Resume optimization: provider orchestration and section rewriting.
// All completions go through llm_client; this module owns retry and fallback.

pub mod handlers;
pub mod orchestrator;
pub mod prompts;

// Shared prompt fragments and prompt-building utilities.
// Each feature that needs completions defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments only.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Prepends user-supplied instructions as a high-priority clause.
/// Blank instructions leave the prompt untouched.
pub fn with_priority_instructions(prompt: String, instructions: Option<&str>) -> String {
    match instructions.map(str::trim) {
        Some(extra) if !extra.is_empty() => format!(
            "IMPORTANT: Please prioritize the following additional instructions: {extra}\n\n{prompt}"
        ),
        _ => prompt,
    }
}

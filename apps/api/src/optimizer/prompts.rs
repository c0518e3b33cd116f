// Prompt constants for section refinement.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::jobs::analysis::JobKeywords;
use crate::llm_client::prompts::with_priority_instructions;
use crate::llm_client::Prompt;
use crate::optimizer::orchestrator::OptimizationRequest;

/// Job descriptions longer than this are cut before being embedded.
const MAX_JD_CHARS: usize = 4000;

pub const REFINE_SYSTEM: &str = "You are a resume optimization expert.";

/// Section refinement template.
/// Replace: {section_id}, {original}, {keyword_guidance}, {job_description}
pub const REFINE_PROMPT_TEMPLATE: &str = r#"Rewrite the resume section "{section_id}" so it speaks directly to the job description below.

ORIGINAL TEXT:
{original}
{keyword_guidance}
JOB DESCRIPTION:
{job_description}

RULES:
1. Keep every fact from the original text; do not invent employers, dates, numbers or tools
2. Lead with strong action verbs and quantify impact where the original provides numbers
3. Work in the job's terminology only where the original supports it
4. Keep roughly the same length and the same line structure as the original
5. Return ONLY the rewritten text: no preamble, no quotes, no markdown"#;

/// Builds the chat prompt for one refinement request.
pub fn build_refine_prompt(request: &OptimizationRequest) -> Prompt {
    let guidance = request
        .keywords
        .as_ref()
        .map(keyword_guidance)
        .unwrap_or_default();
    let job_description: String = request.job_description.trim().chars().take(MAX_JD_CHARS).collect();

    let user = fill_template(
        REFINE_PROMPT_TEMPLATE,
        &[
            ("section_id", request.section_id.as_str()),
            ("original", request.original_text.trim()),
            ("keyword_guidance", guidance.as_str()),
            ("job_description", job_description.as_str()),
        ],
    );

    Prompt::new(
        REFINE_SYSTEM,
        with_priority_instructions(user, request.additional_instructions.as_deref()),
    )
}

/// Substitutes `{name}` placeholders in a single scan of the template.
/// Inserted values are never rescanned.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let matched = values.iter().find_map(|(name, value)| {
            let after = tail.strip_prefix('{')?.strip_prefix(*name)?.strip_prefix('}')?;
            Some((*value, after))
        });
        match matched {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn keyword_guidance(keywords: &JobKeywords) -> String {
    let lines = [
        ("Key skills to highlight", join_first(&keywords.technical_skills, 3)),
        ("Key requirements", join_first(&keywords.key_requirements, 2)),
        ("Tools", join_first(&keywords.ds_tools, usize::MAX)),
        ("Languages", join_first(&keywords.programming_languages, usize::MAX)),
        ("Metrics to emphasize", join_first(&keywords.metrics, usize::MAX)),
        ("Certifications", join_first(&keywords.certifications, usize::MAX)),
    ];

    let body: Vec<String> = lines
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(label, value)| format!("- {label}: {value}"))
        .collect();

    if body.is_empty() {
        String::new()
    } else {
        format!("\nJOB KEYWORDS:\n{}\n", body.join("\n"))
    }
}

fn join_first(items: &[String], n: usize) -> String {
    items
        .iter()
        .take(n)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

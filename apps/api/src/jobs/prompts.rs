// Prompt constants for job description analysis.

/// System prompt for keyword extraction. Combined with the JSON-only fragment.
pub const KEYWORDS_SYSTEM: &str = "You are a job description analyzer.";

/// Keyword extraction template. Replace `{job_description}` before sending.
pub const KEYWORDS_PROMPT_TEMPLATE: &str = r#"Analyze this job description and return a JSON object in this EXACT format, with no additional text or explanation:

{
    "technical_skills": ["skill1", "skill2", "skill3", "skill4", "skill5"],
    "key_requirements": ["req1", "req2", "req3", "req4"],
    "ds_tools": ["tool1", "tool2", "tool3"],
    "programming_languages": ["lang1", "lang2"],
    "metrics": ["metric1", "metric2"],
    "certifications": ["cert1", "cert2"]
}

Replace the placeholder values with actual values from this job description: {job_description}"#;

pub const DETAILS_SYSTEM: &str = "You are a job description parser.";

/// Title/company extraction template. Replace `{job_description}` before sending.
pub const DETAILS_PROMPT_TEMPLATE: &str = r#"Extract just the job title and company name from this job description.
Return ONLY in this format: "Job Title | Company Name"
Job Description: {job_description}"#;

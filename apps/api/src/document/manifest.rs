//! Render manifest: download filename and PDF metadata for a document.

use chrono::NaiveDate;
use serde::Serialize;

use crate::document::ResumeDocument;
use crate::jobs::analysis::JobDetails;

const CREATOR: &str = "Resume Generator";

/// Characters that are not allowed in a download filename.
const FILENAME_FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfMetadata {
    pub title: String,
    pub author: String,
    pub creator: String,
    pub keywords: String,
}

/// Everything the external renderer needs besides the document itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderManifest {
    pub filename: String,
    pub job_title: String,
    pub company_name: String,
    pub metadata: PdfMetadata,
}

/// Builds the manifest. Unknown title or company fall back to the candidate name.
pub fn build_manifest(
    document: &ResumeDocument,
    details: Option<&JobDetails>,
    date: NaiveDate,
) -> RenderManifest {
    let job_title = details
        .map(|d| d.job_title.clone())
        .unwrap_or_else(|| document.name.clone());
    let company_name = details
        .map(|d| d.company_name.clone())
        .unwrap_or_else(|| document.name.clone());
    let stamp = date.format("%Y%m%d").to_string();

    let (title_part, company_part) = (clean_filename(&job_title), clean_filename(&company_name));
    let filename = if title_part.is_empty() || company_part.is_empty() {
        format!("Resume_{stamp}.pdf")
    } else {
        format!("Resume_{title_part}-{company_part}_{stamp}.pdf")
    };

    let metadata = PdfMetadata {
        title: format!("Resume for {job_title} position at {company_name}"),
        author: document.name.clone(),
        creator: CREATOR.to_string(),
        keywords: format!("resume, {job_title}, {company_name}, {stamp}"),
    };

    RenderManifest {
        filename,
        job_title,
        company_name,
        metadata,
    }
}

/// Drops forbidden characters and collapses whitespace/underscore runs to one `_`.
pub fn clean_filename(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.chars().filter(|c| !FILENAME_FORBIDDEN.contains(c)) {
        if c.is_whitespace() || c == '_' {
            pending_separator = true;
            continue;
        }
        if pending_separator && !cleaned.is_empty() {
            cleaned.push('_');
        }
        pending_separator = false;
        cleaned.push(c);
    }

    cleaned
}

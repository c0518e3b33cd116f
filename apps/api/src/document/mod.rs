//! Document Assembler: the structured resume that optimized text is merged
//! into, and the manifest handed to the external PDF renderer.
//!
//! Documents are values: `apply` returns a new document and leaves every block
//! it was not asked to touch structurally identical.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod handlers;
pub mod manifest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeDocument {
    /// Candidate name, printed as the page header.
    pub name: String,
    /// One-line contact details under the name.
    #[serde(default)]
    pub contact: String,
    pub sections: Vec<Section>,
}

/// A titled part of the resume, e.g. "RELEVANT EXPERIENCE".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub blocks: Vec<Block>,
}

/// The unit of optimization. `id` is the section identifier requests refer to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub subheading: Option<String>,
    pub text: String,
    #[serde(default)]
    pub style: BlockStyle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockStyle {
    #[default]
    Paragraph,
    /// One bullet per line of `text`.
    Bullets,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("unknown section '{0}'")]
    UnknownSection(String),

    #[error("section id '{0}' appears more than once")]
    DuplicateSection(String),

    #[error("optimized text for section '{0}' is empty")]
    EmptyText(String),
}

impl ResumeDocument {
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks().find(|b| b.id == id)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.sections.iter().flat_map(|s| s.blocks.iter())
    }

    /// Checks that block ids are unique.
    pub fn validate(&self) -> Result<(), AssemblyError> {
        let mut seen = std::collections::HashSet::new();
        for block in self.blocks() {
            if !seen.insert(block.id.as_str()) {
                return Err(AssemblyError::DuplicateSection(block.id.clone()));
            }
        }
        Ok(())
    }
}

/// Returns a copy of `document` with `section_id`'s text replaced.
pub fn apply(
    document: &ResumeDocument,
    section_id: &str,
    optimized_text: &str,
) -> Result<ResumeDocument, AssemblyError> {
    let text = normalize_text(optimized_text.trim());
    if text.is_empty() {
        return Err(AssemblyError::EmptyText(section_id.to_string()));
    }

    let mut updated = document.clone();
    let block = updated
        .sections
        .iter_mut()
        .flat_map(|s| s.blocks.iter_mut())
        .find(|b| b.id == section_id)
        .ok_or_else(|| AssemblyError::UnknownSection(section_id.to_string()))?;
    block.text = text;

    Ok(updated)
}

/// Replaces typographic quotes with their ASCII forms; the renderer's core
/// fonts have no glyphs for them.
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            other => other,
        })
        .collect()
}

//! Text processing utilities.

use crate::models::ProjectRecord;

/// Build the string that gets embedded for a project.
///
/// Title, summary and space-joined keywords, in that order, lowercased and
/// trimmed. Metadata fields are never part of the embedded text.
pub fn normalize_project_text(project: &ProjectRecord) -> String {
    let keywords = project.keywords.join(" ");
    format!("{} {} {}", project.title, project.summary, keywords)
        .to_lowercase()
        .trim()
        .to_string()
}

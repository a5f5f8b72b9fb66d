//! Generator response contract
//!
//! The prompt asks the model for a free-text description followed by a line
//! starting with [`INDIVIDUALS_MARKER`] and a comma separated list of names.
//! Parsing depends on the marker byte-for-byte.

use crate::models::ParsedOutput;

/// Separator between the description and the individuals list
pub const INDIVIDUALS_MARKER: &str = "||INDIVIDUALS||:";

/// Built-in instruction sent alongside every medium
pub const DEFAULT_PROMPT: &str = r#"
### ROLE
You are a Precision Video Logger.

### TASK
Analyze the video and output a SINGLE string of text.

### EXTRACTION RULE
After the description, output:
"||INDIVIDUALS||: " + comma separated names.
"#;

/// Split raw generator text into description and individuals
///
/// Only the first marker occurrence splits. Without a marker the whole
/// trimmed text is the description and individuals is empty.
pub fn parse_response(raw: &str) -> ParsedOutput {
    match raw.split_once(INDIVIDUALS_MARKER) {
        Some((description, individuals)) => ParsedOutput {
            description: description.trim().to_string(),
            individuals: clean_individuals(individuals),
        },
        None => ParsedOutput {
            description: raw.trim().to_string(),
            individuals: String::new(),
        },
    }
}

/// Strip surrounding whitespace and stray leading/trailing commas
fn clean_individuals(raw: &str) -> String {
    raw.trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

/// Whether a prompt template asks for the marker the parser expects
pub fn prompt_requests_marker(prompt: &str) -> bool {
    prompt.contains(INDIVIDUALS_MARKER)
}

//! Cleaning applied to every block recovered from a report.

use std::sync::LazyLock;

use regex::Regex;

/// Checkbox glyphs stripped from anywhere in a line.
const CHECKBOX_GLYPHS: &[char] = &['☐', '☑', '☒', '□', '■', '▢', '✓', '✔', '✗', '✘'];

/// Lines that carry no content of their own.
const FILLER_LINES: &[&str] = &["see above", "as above", "n/a", "nil"];

/// Template question stems (lowercase prefixes).
const QUESTION_STEMS: &[&str] = &[
    "are there any factors that may affect",
    "are there any adjustments",
    "give details of any index offence",
    "give details of any previous involvement",
    "give a brief summary of the circumstances",
    "give details of the patient's",
    "what are the dates of the patient's previous",
    "what are the circumstances leading up to",
    "is the patient now suffering from a mental disorder",
    "does the patient have a learning disability",
    "is that learning disability associated with",
    "is there any detention or hospital treatment",
    "is there any detention",
    "what appropriate and available medical treatment",
    "what are the strengths or positive factors",
    "what is the patient's current progress",
    "what is the patient's understanding of",
    "in the case of an eligible compliant patient",
    "in the case of a patient detained",
    "are there any other relevant facts",
    "would the patient, if discharged",
    "would the patient if discharged",
    "if the patient was discharged",
    "if the patient were discharged",
    "please explain how risks could be managed",
    "do you have any recommendations",
    "is there any other relevant information",
];

static CHECKBOX_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\s*[xX✓✔]?\s*\]").expect("Invalid checkbox regex"));

/// Numbered template question: number, then a question word.
static NUMBERED_QUESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*\d{1,2}[.)]\s+(?:What|Are|Is|Give|Do|Does|Has|Have|Was|Were|Would|Could|Can|Please|Provide|Describe|If|In the case)\b",
    )
    .expect("Invalid numbered question regex")
});

static EXCESS_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("Invalid blank line regex"));

/// Remove checkbox glyphs and bracketed boxes.
pub fn strip_checkboxes(line: &str) -> String {
    let without_brackets = CHECKBOX_BRACKETS.replace_all(line, "");
    without_brackets
        .chars()
        .filter(|c| !CHECKBOX_GLYPHS.contains(c))
        .collect()
}

fn has_checkbox(line: &str) -> bool {
    line.chars().any(|c| CHECKBOX_GLYPHS.contains(&c)) || CHECKBOX_BRACKETS.is_match(line)
}

/// A row made only of checkboxes and Yes/No/N/A options.
///
/// A bare "No" is an answer, not a row, so a row needs a glyph or at least
/// two option tokens.
pub fn is_checkbox_row(line: &str) -> bool {
    let stripped = strip_checkboxes(line);
    let tokens: Vec<String> = stripped
        .split(|c: char| c.is_whitespace() || c == '|' || c == ',')
        .map(|t| t.trim_matches(|c: char| c == '.' || c == ':').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    let all_options = tokens
        .iter()
        .all(|t| matches!(t.as_str(), "yes" | "no" | "n/a" | "na"));
    if !all_options {
        return false;
    }
    has_checkbox(line) || tokens.len() >= 2
}

pub fn is_filler_line(line: &str) -> bool {
    let lower = line.trim().trim_end_matches('.').to_lowercase();
    FILLER_LINES.contains(&lower.as_str())
}

/// Template question prose copied from the blank form.
pub fn is_template_question(line: &str) -> bool {
    let trimmed = line.trim();
    if NUMBERED_QUESTION.is_match(trimmed) {
        return true;
    }
    let lower = trimmed.to_lowercase();
    QUESTION_STEMS.iter().any(|stem| lower.starts_with(stem))
}

/// Answer written on the same line as a template question: whatever follows
/// the first question mark. Empty when the line is all question.
pub fn answer_after_question(line: &str) -> &str {
    line.split_once('?').map_or("", |(_, answer)| answer.trim())
}

/// Clean a recovered block; empty string when nothing survives.
pub fn clean_block(text: &str) -> String {
    let kept: Vec<String> = text
        .lines()
        .filter_map(|line| {
            if line.trim().is_empty() {
                return Some(String::new());
            }
            let line = if is_template_question(line) {
                answer_after_question(line)
            } else {
                line
            };
            if line.is_empty() || is_checkbox_row(line) || is_filler_line(line) {
                return None;
            }
            let stripped = strip_checkboxes(line);
            let stripped = if has_checkbox(line) {
                stripped.trim()
            } else {
                stripped.trim_end()
            };
            if stripped.is_empty() {
                None
            } else {
                Some(stripped.to_string())
            }
        })
        .collect();

    let joined = kept.join("\n");
    EXCESS_BLANK_LINES
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Maximum snippet length in characters, ellipsis included.
pub const SNIPPET_MAX_CHARS: usize = 200;

const ELLIPSIS: &str = "...";

/// A piece of extracted content offered to the form for selection.
///
/// The engine never mutates an entry after creating it; only the form
/// toggles `selected`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedEntry {
    /// Absent for report-derived entries.
    pub date: Option<NaiveDateTime>,
    pub text: String,
    pub snippet: String,
    pub categories: Vec<String>,
    #[serde(default)]
    pub selected: bool,
}

impl ImportedEntry {
    pub fn new(date: Option<NaiveDateTime>, text: impl Into<String>, categories: Vec<String>) -> Self {
        let text = text.into();
        let snippet = make_snippet(&text, SNIPPET_MAX_CHARS);
        Self {
            date,
            text,
            snippet,
            categories: dedup_categories(categories),
            selected: false,
        }
    }

    /// Entry whose preview comes from a context window rather than the text itself.
    pub fn with_context(
        date: Option<NaiveDateTime>,
        text: impl Into<String>,
        context: &str,
        categories: Vec<String>,
    ) -> Self {
        let mut entry = Self::new(date, text, categories);
        let snippet = make_snippet(context, SNIPPET_MAX_CHARS);
        // Snippet may never outgrow the text it previews.
        if snippet.chars().count() <= entry.text.chars().count() {
            entry.snippet = snippet;
        }
        entry
    }
}

/// Bounded preview: the text itself if it fits, else at most `max`
/// characters ending in an ellipsis.
pub fn make_snippet(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max.saturating_sub(ELLIPSIS.len())).collect();
    let mut snippet = head.trim_end().to_string();
    snippet.push_str(ELLIPSIS);
    snippet
}

/// Ordered set: first occurrence wins, empty tags dropped.
fn dedup_categories(categories: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(categories.len());
    for c in categories {
        let c = c.trim().to_string();
        if !c.is_empty() && !out.iter().any(|e| e.eq_ignore_ascii_case(&c)) {
            out.push(c);
        }
    }
    out
}

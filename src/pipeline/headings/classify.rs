/// Classify a line against candidate heading phrases.
///
/// Only exact and prefix matches count; a phrase embedded mid-sentence is
/// not a heading. Returns the first matching phrase in candidate order.
pub fn classify_heading<'a>(line: &str, phrases: &[&'a str]) -> Option<&'a str> {
    let lower = line.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    let cleaned = clean_heading(&lower);
    let short_labelled = (lower.contains(':') || lower.contains('-'))
        && lower.split_whitespace().count() <= 4;

    phrases.iter().copied().find(|phrase| {
        if phrase.is_empty() {
            return false;
        }
        cleaned == *phrase
            || starts_with_word(&cleaned, phrase)
            || lower.starts_with(phrase)
            || (short_labelled && cleaned.starts_with(phrase))
    })
}

/// Whether a line is a heading for any of the phrases.
pub fn is_heading(line: &str, phrases: &[&str]) -> bool {
    classify_heading(line, phrases).is_some()
}

/// Drop colons, turn dashes into spaces, trim.
fn clean_heading(lower: &str) -> String {
    lower.replace(':', "").replace('-', " ").trim().to_string()
}

/// `text` starts with `phrase` followed by a space.
fn starts_with_word(text: &str, phrase: &str) -> bool {
    text.strip_prefix(phrase)
        .is_some_and(|rest| rest.starts_with(' '))
}

use super::classify::classify_heading;

/// A located section: where it sits in the text and what it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMatch<'a> {
    /// Target phrase that opened the section.
    pub heading: &'a str,
    /// Index of the heading line.
    pub start_line: usize,
    /// Index of the first line after the section (exclusive).
    pub end_line: usize,
    pub content: String,
}

/// Extract the first section opened by one of `targets`.
///
/// The section runs until the next line that is a heading in `vocabulary`
/// (or in `targets`) with a different phrase. Text after a colon on the
/// heading line is kept as the first line of content.
pub fn extract_section(text: &str, targets: &[&str], vocabulary: &[&str]) -> Option<String> {
    find_section(text, targets, vocabulary).map(|m| m.content)
}

/// Like [`extract_section`], but content shorter than `min_chars` counts as absent.
pub fn extract_section_min(
    text: &str,
    targets: &[&str],
    vocabulary: &[&str],
    min_chars: usize,
) -> Option<String> {
    extract_section(text, targets, vocabulary).filter(|c| c.chars().count() >= min_chars)
}

pub fn find_section<'a>(
    text: &str,
    targets: &[&'a str],
    vocabulary: &[&str],
) -> Option<SectionMatch<'a>> {
    let lines: Vec<&str> = text.lines().collect();

    let (start_line, heading) = lines
        .iter()
        .enumerate()
        .find_map(|(i, line)| classify_heading(line, targets).map(|h| (i, h)))?;

    let end_line = lines
        .iter()
        .enumerate()
        .skip(start_line + 1)
        .filter(|(_, line)| !line.trim().is_empty())
        .find(|(_, line)| {
            let next = classify_heading(line, vocabulary).or_else(|| classify_heading(line, targets));
            next.is_some_and(|phrase| phrase != heading)
        })
        .map(|(i, _)| i)
        .unwrap_or(lines.len());

    let body = lines[start_line + 1..end_line].join("\n");
    let body = body.trim();

    let inline = lines[start_line]
        .split_once(':')
        .map(|(_, after)| after.trim())
        .filter(|after| !after.is_empty());

    let content = match inline {
        Some(inline) if body.is_empty() => inline.to_string(),
        Some(inline) => format!("{inline}\n{body}"),
        None => body.to_string(),
    };

    if content.is_empty() {
        return None;
    }

    Some(SectionMatch {
        heading,
        start_line,
        end_line,
        content,
    })
}

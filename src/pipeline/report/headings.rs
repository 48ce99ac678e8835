//! Prose-heading report parsing.
//!
//! Lines are scanned for known heading phrases. A candidate line is
//! rejected when it names two different sections (a table header row),
//! when the phrase is a small part of a long line, when the phrase is
//! followed by a comma, or when no phrase for its section sits near the
//! start of the line. All-caps lines skip the last check.

use crate::config::EngineConfig;
use crate::models::ReportSection;
use crate::pipeline::headings::{report_headings, HeadingPattern};

use super::sanitize::clean_block;
use super::{append_section, SectionMap};

/// Lines this long are prose, never headings.
const MAX_HEADING_LINE_CHARS: usize = 150;
/// Lines shorter than this pass the coverage check outright.
const SHORT_LINE_CHARS: usize = 80;
/// Otherwise the phrase must cover more than this share of the line.
const MIN_PATTERN_COVERAGE: f64 = 0.25;

/// An accepted heading line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeadingHit {
    section: ReportSection,
    /// Byte offset of the heading line.
    line_start: usize,
    /// Byte offset just past the matched phrase.
    content_start: usize,
}

fn is_all_caps(line: &str) -> bool {
    line.chars().any(|c| c.is_alphabetic()) && line == line.to_uppercase()
}

/// A line that is exactly a section's exported label, optionally with a
/// trailing colon. Bare labels such as "Risk" are too generic to match as
/// substrings, so they only count as a whole line.
fn label_line(line: &str, patterns: &[HeadingPattern]) -> Option<ReportSection> {
    let bare = line.trim_end_matches([':', ' ']);
    ReportSection::ALL
        .iter()
        .copied()
        .filter(|s| patterns.iter().any(|p| p.section == *s))
        .find(|s| s.label().eq_ignore_ascii_case(bare))
}

/// Decide whether one line is a heading. `line` is trimmed; offsets are
/// relative to it.
fn heading_in_line(line: &str, patterns: &[HeadingPattern], prefix_window: usize) -> Option<(ReportSection, usize)> {
    if line.is_empty() || line.chars().count() >= MAX_HEADING_LINE_CHARS {
        return None;
    }
    if let Some(section) = label_line(line, patterns) {
        return Some((section, line.len()));
    }
    // ASCII lowering keeps byte offsets aligned with `line`.
    let lower = line.to_ascii_lowercase();

    let matched: Vec<&HeadingPattern> = patterns
        .iter()
        .filter(|p| lower.contains(p.pattern))
        .collect();
    let first = matched.first()?;
    if matched.iter().any(|p| p.section != first.section) {
        return None;
    }
    let section = first.section;

    let mut best = *first;
    for p in &matched[1..] {
        if p.pattern.len() > best.pattern.len() {
            best = *p;
        }
    }

    let line_chars = line.chars().count();
    let coverage = best.pattern.len() as f64 / line_chars as f64;
    if line_chars >= SHORT_LINE_CHARS && coverage <= MIN_PATTERN_COVERAGE {
        return None;
    }

    let pos = lower.find(best.pattern)?;
    let end = pos + best.pattern.len();
    if lower[end..].trim_start().starts_with(',') {
        return None;
    }

    if !is_all_caps(line) {
        let near_start = matched
            .iter()
            .any(|p| lower.match_indices(p.pattern).any(|(i, _)| i < prefix_window));
        if !near_start {
            return None;
        }
    }

    Some((section, end))
}

fn find_headings(text: &str, patterns: &[HeadingPattern], prefix_window: usize) -> Vec<HeadingHit> {
    let mut hits = Vec::new();
    let mut offset = 0;
    for raw in text.split('\n') {
        let lead = raw.len() - raw.trim_start().len();
        let line = raw.trim();
        if let Some((section, end)) = heading_in_line(line, patterns, prefix_window) {
            hits.push(HeadingHit {
                section,
                line_start: offset,
                content_start: offset + lead + end,
            });
        }
        offset += raw.len() + 1;
    }
    hits
}

/// Parse a report by its prose headings. Sections repeated in the text
/// are appended in document order.
pub fn parse_headings(text: &str, config: &EngineConfig) -> SectionMap {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let patterns = report_headings(config.form_variant);
    let hits = find_headings(&normalized, &patterns, config.heading_prefix_window);

    let mut sections = SectionMap::new();
    for (i, hit) in hits.iter().enumerate() {
        let end = hits
            .get(i + 1)
            .map_or(normalized.len(), |next| next.line_start);
        let raw = normalized[hit.content_start..end].trim_start();
        let raw = raw.strip_prefix([':', '.', ';']).unwrap_or(raw);
        let content = clean_block(raw);
        if !content.is_empty() {
            append_section(&mut sections, hit.section, &content);
        }
    }

    tracing::debug!(
        headings = hits.len(),
        sections = sections.len(),
        "Heading mode parsed"
    );
    sections
}

//! Report-vs-notes classification.
//!
//! Five independent signals, checked in order; any one is enough.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{ClinicalNote, FormVariant, ReportSection};
use crate::pipeline::headings::{classify_heading, report_headings, section_for_pattern};

use super::numbered::T131_LAST_QUESTION;

/// Phrases found in finished tribunal reports far more than in notes.
const REPORT_FINGERPRINTS: &[&str] = &[
    "mental health tribunal",
    "first-tier tribunal",
    "tribunal report",
    "forensic history",
    "statutory criteria",
    "responsible clinician",
    "nearest relative",
    "hospital managers",
    "community treatment order",
    "recommendations to the tribunal",
    "least restrictive",
];

const SINGLE_NOTE_MIN_CHARS: usize = 2000;
const SINGLE_NOTE_MIN_FINGERPRINTS: usize = 2;
const MIN_NUMBERED_MARKERS: usize = 5;
const MIN_FINGERPRINTS: usize = 3;
const UNSTRUCTURED_MIN_CHARS: usize = 500;
const UNSTRUCTURED_MIN_MARKERS: usize = 2;
const MIN_SECTIONS: usize = 3;

static NUMBERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)[.)]\s*").expect("Invalid numbered marker regex"));

/// Which test classified the text as a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSignal {
    /// One long note carrying report phrases.
    SingleLongNote,
    /// Enough question numbers for a T131 form.
    NumberedMarkers,
    Fingerprints,
    /// Long text with no notes and weak report signals.
    UnstructuredText,
    SectionHeadings,
}

impl ReportSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleLongNote => "single_long_note",
            Self::NumberedMarkers => "numbered_markers",
            Self::Fingerprints => "fingerprints",
            Self::UnstructuredText => "unstructured_text",
            Self::SectionHeadings => "section_headings",
        }
    }
}

/// Distinct fingerprint phrases present in `text`.
pub fn fingerprint_count(text: &str) -> usize {
    let lower = text.to_lowercase();
    REPORT_FINGERPRINTS
        .iter()
        .filter(|phrase| lower.contains(*phrase))
        .count()
}

/// Distinct question numbers (1..=24) opening a line.
pub fn numbered_marker_count(text: &str) -> usize {
    text.lines()
        .filter_map(|line| NUMBERED_MARKER.captures(line)?.get(1)?.as_str().parse::<u32>().ok())
        .filter(|n| (1..=T131_LAST_QUESTION).contains(n))
        .collect::<BTreeSet<_>>()
        .len()
}

/// Distinct canonical sections whose heading opens some line.
pub fn section_heading_count(text: &str, variant: FormVariant) -> usize {
    let patterns = report_headings(variant);
    let phrases: Vec<&str> = patterns.iter().map(|p| p.pattern).collect();
    text.lines()
        .filter_map(|line| classify_heading(line, &phrases))
        .filter_map(section_for_pattern)
        .collect::<BTreeSet<ReportSection>>()
        .len()
}

/// The first signal that marks `text` as a report, if any.
pub fn report_signal(text: &str, notes: &[ClinicalNote], variant: FormVariant) -> Option<ReportSignal> {
    if let [only] = notes {
        if only.body_len() > SINGLE_NOTE_MIN_CHARS
            && fingerprint_count(&only.body) >= SINGLE_NOTE_MIN_FINGERPRINTS
        {
            return Some(ReportSignal::SingleLongNote);
        }
    }

    let markers = numbered_marker_count(text);
    if markers >= MIN_NUMBERED_MARKERS {
        return Some(ReportSignal::NumberedMarkers);
    }

    let fingerprints = fingerprint_count(text);
    if fingerprints >= MIN_FINGERPRINTS {
        return Some(ReportSignal::Fingerprints);
    }

    if notes.is_empty()
        && text.chars().count() > UNSTRUCTURED_MIN_CHARS
        && (markers >= UNSTRUCTURED_MIN_MARKERS || fingerprints >= 1)
    {
        return Some(ReportSignal::UnstructuredText);
    }

    if section_heading_count(text, variant) >= MIN_SECTIONS {
        return Some(ReportSignal::SectionHeadings);
    }

    None
}

/// Whether an imported document is a finished report rather than raw notes.
/// Undecided means notes.
pub fn is_report(text: &str, notes: &[ClinicalNote], variant: FormVariant) -> bool {
    let signal = report_signal(text, notes, variant);
    tracing::debug!(
        notes = notes.len(),
        signal = signal.map(|s| s.as_str()),
        "Report classification"
    );
    signal.is_some()
}

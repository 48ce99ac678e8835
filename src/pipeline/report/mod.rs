//! Report → sections: classification, numbered and heading parsers, and
//! patient-detail extraction.

pub mod classify;
pub mod headings;
pub mod numbered;
pub mod patient;
pub mod sanitize;

pub use classify::{is_report, report_signal, ReportSignal};
pub use headings::parse_headings;
pub use numbered::parse_numbered;
pub use patient::{extract_patient_details, parse_report_date, PatientDetails};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::{ImportedEntry, ParseMode, ReportSection};
use crate::pipeline::headings::{extract_section_min, REPORT_HEADINGS};

/// Canonical section → accumulated text.
pub type SectionMap = BTreeMap<ReportSection, String>;

/// Append a fragment to a section, blank-line separated.
pub fn append_section(sections: &mut SectionMap, section: ReportSection, fragment: &str) {
    sections
        .entry(section)
        .and_modify(|existing| {
            existing.push_str("\n\n");
            existing.push_str(fragment);
        })
        .or_insert_with(|| fragment.to_string());
}

/// A parsed report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportImport {
    pub mode: ParseMode,
    pub sections: SectionMap,
    pub patient_details: PatientDetails,
}

impl ReportImport {
    /// One undated entry per section, tagged with the section label.
    pub fn entries(&self) -> Vec<(ReportSection, ImportedEntry)> {
        self.sections
            .iter()
            .map(|(section, text)| {
                let entry = ImportedEntry::new(None, text.clone(), vec![section.label().to_string()]);
                (*section, entry)
            })
            .collect()
    }
}

/// Split a report into canonical sections. Numbered mode is tried first;
/// if it recovers too few questions the heading parser's result stands,
/// even when empty.
pub fn parse_report(text: &str, config: &EngineConfig) -> ReportImport {
    let (mode, sections) = match parse_numbered(text, config) {
        Some(sections) => (ParseMode::Numbered, sections),
        None => {
            let sections = parse_headings(text, config);
            let mode = if sections.is_empty() {
                ParseMode::Empty
            } else {
                ParseMode::Headings
            };
            (mode, sections)
        }
    };

    let patient_details = sections
        .get(&ReportSection::PatientDetails)
        .map(|details| extract_patient_details(details))
        .unwrap_or_default();

    tracing::info!(
        mode = mode.as_str(),
        sections = sections.len(),
        patient_fields = !patient_details.is_empty(),
        "Report parsed"
    );

    ReportImport {
        mode,
        sections,
        patient_details,
    }
}

/// Extract one section from report text with the generic section
/// extractor. Content shorter than the configured minimum is treated as
/// absent.
pub fn extract_report_section(text: &str, section: ReportSection, config: &EngineConfig) -> Option<String> {
    let targets: Vec<&str> = REPORT_HEADINGS
        .iter()
        .filter(|p| p.section == section)
        .map(|p| p.pattern)
        .collect();
    if targets.is_empty() {
        return None;
    }
    let vocabulary: Vec<&str> = REPORT_HEADINGS.iter().map(|p| p.pattern).collect();
    extract_section_min(text, &targets, &vocabulary, config.report_min_section_chars)
}

//! Static heading vocabularies.
//!
//! Order matters: classification surfaces the first phrase that matches,
//! and report-side selection breaks ties by longest phrase.

use std::sync::LazyLock;

use crate::models::{FormVariant, ReportSection};

/// A lowercase heading phrase and the report section it denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingPattern {
    pub pattern: &'static str,
    pub section: ReportSection,
}

const fn hp(pattern: &'static str, section: ReportSection) -> HeadingPattern {
    HeadingPattern { pattern, section }
}

// ── Note-side category headings ──────────────────────────────────────────

pub const BACKGROUND_HEADINGS: &[&str] = &[
    "personal and social history",
    "personal history",
    "family history",
    "developmental history",
    "social history",
    "background history",
    "early history",
    "childhood",
    "education and employment",
];

pub const MEDICAL_HEADINGS: &[&str] = &[
    "past medical history",
    "medical history",
    "physical health history",
    "physical health",
    "physical history",
    "pmh",
];

pub const PSYCHIATRIC_HEADINGS: &[&str] = &[
    "past psychiatric history",
    "previous psychiatric history",
    "psychiatric history",
    "past mental health history",
    "history of mental illness",
    "pph",
];

pub const FORENSIC_HEADINGS: &[&str] = &[
    "forensic history",
    "criminal history",
    "offending history",
    "police contact",
    "forensic",
];

/// Headings that appear in notes but are never extraction targets.
/// They only bound the end of a target section.
const OTHER_NOTE_HEADINGS: &[&str] = &[
    "history of presenting complaint",
    "presenting complaint",
    "hpc",
    "circumstances of admission",
    "reason for admission",
    "reason for referral",
    "collateral history",
    "drug and alcohol history",
    "substance misuse",
    "substance use",
    "alcohol",
    "illicit drugs",
    "drug history",
    "current medication",
    "medication",
    "allergies",
    "mental state examination",
    "mse",
    "physical examination",
    "investigations",
    "risk assessment",
    "risk",
    "impression",
    "formulation",
    "diagnosis",
    "management plan",
    "plan",
    "capacity",
    "premorbid personality",
];

/// Every heading phrase known on the note side, used to find section ends.
pub static NOTE_HEADINGS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut all: Vec<&'static str> = Vec::new();
    for table in [
        BACKGROUND_HEADINGS,
        MEDICAL_HEADINGS,
        PSYCHIATRIC_HEADINGS,
        FORENSIC_HEADINGS,
        OTHER_NOTE_HEADINGS,
    ] {
        for phrase in table {
            if !all.contains(phrase) {
                all.push(phrase);
            }
        }
    }
    all
});

// ── Report-side headings ─────────────────────────────────────────────────

pub static REPORT_HEADINGS: &[HeadingPattern] = &[
    hp("patient details", ReportSection::PatientDetails),
    hp("patient information", ReportSection::PatientDetails),
    hp("personal details", ReportSection::PatientDetails),
    hp("factors affecting the hearing", ReportSection::Adjustments),
    hp("factors that may affect", ReportSection::Adjustments),
    hp("reasonable adjustments", ReportSection::Adjustments),
    hp("adjustments", ReportSection::Adjustments),
    hp("forensic history", ReportSection::Forensic),
    hp("offending history", ReportSection::Forensic),
    hp("criminal history", ReportSection::Forensic),
    hp("index offence", ReportSection::Forensic),
    hp("previous involvement", ReportSection::PreviousInvolvement),
    hp("involvement with mental health services", ReportSection::PreviousInvolvement),
    hp("past psychiatric history", ReportSection::PreviousInvolvement),
    hp("psychiatric history", ReportSection::PreviousInvolvement),
    hp("previous admissions", ReportSection::PreviousAdmissions),
    hp("reasons for previous admission", ReportSection::PreviousAdmissions),
    hp("circumstances of current admission", ReportSection::CurrentAdmission),
    hp("circumstances leading to admission", ReportSection::CurrentAdmission),
    hp("circumstances of admission", ReportSection::CurrentAdmission),
    hp("current admission", ReportSection::CurrentAdmission),
    hp("reason for admission", ReportSection::CurrentAdmission),
    hp("nature of mental disorder", ReportSection::Diagnosis),
    hp("mental disorder", ReportSection::Diagnosis),
    hp("diagnosis", ReportSection::Diagnosis),
    hp("learning disability", ReportSection::LearningDisability),
    hp("detention required", ReportSection::DetentionRequired),
    hp("need for detention", ReportSection::DetentionRequired),
    hp("nature and degree", ReportSection::DetentionRequired),
    hp("medical treatment", ReportSection::Treatment),
    hp("treatment plan", ReportSection::Treatment),
    hp("current medication", ReportSection::Treatment),
    hp("strengths or positive factors", ReportSection::Strengths),
    hp("positive factors", ReportSection::Strengths),
    hp("strengths", ReportSection::Strengths),
    hp("current progress", ReportSection::Progress),
    hp("progress on the ward", ReportSection::Progress),
    hp("progress during admission", ReportSection::Progress),
    hp("understanding and compliance", ReportSection::Compliance),
    hp("understanding of treatment", ReportSection::Compliance),
    hp("compliance with treatment", ReportSection::Compliance),
    hp("compliance", ReportSection::Compliance),
    hp("background information", ReportSection::Background),
    hp("personal history", ReportSection::Background),
    hp("social history", ReportSection::Background),
    hp("family history", ReportSection::Background),
    hp("background history", ReportSection::Background),
    hp("personal circumstances", ReportSection::Background),
    hp("past medical history", ReportSection::MedicalHistory),
    hp("medical history", ReportSection::MedicalHistory),
    hp("physical health", ReportSection::MedicalHistory),
    hp("substance misuse", ReportSection::SubstanceUse),
    hp("substance use", ReportSection::SubstanceUse),
    hp("drug and alcohol", ReportSection::SubstanceUse),
    hp("alcohol and drug", ReportSection::SubstanceUse),
    hp("risk assessment", ReportSection::Risk),
    hp("risk history", ReportSection::Risk),
    hp("risk of harm", ReportSection::Risk),
    hp("risk to self", ReportSection::Risk),
    hp("risk to others", ReportSection::Risk),
    hp("incidents of harm", ReportSection::Risk),
    hp("statutory criteria", ReportSection::LegalCriteria),
    hp("legal criteria", ReportSection::LegalCriteria),
    hp("criteria for detention", ReportSection::LegalCriteria),
    hp("risk if discharged", ReportSection::Discharge),
    hp("if discharged", ReportSection::Discharge),
    hp("community risk management", ReportSection::Discharge),
    hp("discharge planning", ReportSection::Discharge),
    hp("recommendations", ReportSection::Recommendations),
    hp("recommendation to the tribunal", ReportSection::Recommendations),
    hp("signature", ReportSection::Signature),
    hp("statement of truth", ReportSection::Signature),
];

/// Report heading patterns restricted to the sections a form variant carries.
pub fn report_headings(variant: FormVariant) -> Vec<HeadingPattern> {
    REPORT_HEADINGS
        .iter()
        .copied()
        .filter(|p| variant.includes(p.section))
        .collect()
}

/// Section a report heading phrase denotes.
pub fn section_for_pattern(pattern: &str) -> Option<ReportSection> {
    REPORT_HEADINGS
        .iter()
        .find(|p| p.pattern == pattern)
        .map(|p| p.section)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_headings_cover_every_category() {
        for table in [BACKGROUND_HEADINGS, MEDICAL_HEADINGS, PSYCHIATRIC_HEADINGS, FORENSIC_HEADINGS] {
            for phrase in table {
                assert!(NOTE_HEADINGS.contains(phrase), "{phrase} missing from vocabulary");
            }
        }
    }

    #[test]
    fn note_headings_have_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for phrase in NOTE_HEADINGS.iter() {
            assert!(seen.insert(*phrase), "duplicate {phrase}");
        }
    }

    #[test]
    fn all_phrases_are_lowercase() {
        for phrase in NOTE_HEADINGS.iter() {
            assert_eq!(*phrase, phrase.to_lowercase());
        }
        for p in REPORT_HEADINGS {
            assert_eq!(p.pattern, p.pattern.to_lowercase());
        }
    }

    #[test]
    fn every_full_section_has_a_heading() {
        for section in FormVariant::Full.sections() {
            assert!(
                REPORT_HEADINGS.iter().any(|p| p.section == *section),
                "{section} has no heading pattern"
            );
        }
    }

    #[test]
    fn compact_table_drops_legal_criteria() {
        let compact = report_headings(FormVariant::Compact);
        assert!(compact.iter().all(|p| p.section != ReportSection::LegalCriteria));
        assert!(compact.iter().any(|p| p.section == ReportSection::Risk));
    }

    #[test]
    fn pattern_lookup() {
        assert_eq!(section_for_pattern("statutory criteria"), Some(ReportSection::LegalCriteria));
        assert_eq!(section_for_pattern("nonsense"), None);
    }
}

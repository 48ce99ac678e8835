//! Notes → sections: clerking detection and the per-section pipelines.

pub mod categories;
pub mod clerking;

pub use categories::*;
pub use clerking::*;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::{ClinicalNote, Clerking, ImportedEntry, ReportSection};
use crate::pipeline::risk::{grade_risks, RiskGrading};
use crate::pipeline::traits::{
    Categorizer, DiagnosisRecognizer, KeywordSet, MedicationExtractor, TimelineBuilder,
};

/// Everything the notes path recovers for one patient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotesImport {
    pub clerkings: Vec<Clerking>,
    pub background: Vec<ImportedEntry>,
    pub medical_history: Vec<ImportedEntry>,
    pub psychiatric_history: Vec<ImportedEntry>,
    pub forensic_history: Vec<ImportedEntry>,
    pub risk: Vec<ImportedEntry>,
    pub substance_use: Vec<ImportedEntry>,
    pub medications: Vec<ImportedEntry>,
    pub diagnoses: Vec<ImportedEntry>,
    pub risk_grading: RiskGrading,
}

impl NotesImport {
    /// Entries offered for a report section; empty for sections the notes path does not feed.
    pub fn entries(&self, section: ReportSection) -> &[ImportedEntry] {
        match section {
            ReportSection::Background => &self.background,
            ReportSection::MedicalHistory => &self.medical_history,
            ReportSection::PreviousInvolvement => &self.psychiatric_history,
            ReportSection::Forensic => &self.forensic_history,
            ReportSection::Risk => &self.risk,
            ReportSection::SubstanceUse => &self.substance_use,
            ReportSection::Treatment => &self.medications,
            ReportSection::Diagnosis => &self.diagnoses,
            _ => &[],
        }
    }
}

/// Collaborators the notes path consumes.
pub struct NoteCollaborators<'a> {
    pub timeline: &'a dyn TimelineBuilder,
    pub medications: &'a dyn MedicationExtractor,
    pub diagnoses: &'a dyn DiagnosisRecognizer,
    pub categorizer: &'a dyn Categorizer,
}

/// Run every notes pipeline over a patient's note history.
pub fn populate_from_notes(
    notes: &[ClinicalNote],
    collaborators: &NoteCollaborators<'_>,
    config: &EngineConfig,
) -> NotesImport {
    let episodes = collaborators.timeline.build_timeline(notes);
    let clerkings = find_clerkings(notes, &episodes, config);
    let categorizer = collaborators.categorizer;

    let risk = extract_contextual(notes, categorizer, KeywordSet::Risk);
    let risk_grading = grade_risks(&risk, config.current_risk_window_days);

    let import = NotesImport {
        background: extract_background(&clerkings, notes, categorizer, config),
        medical_history: extract_medical_history(&clerkings, notes, categorizer),
        psychiatric_history: extract_psychiatric_history(&clerkings, categorizer),
        forensic_history: extract_forensic_history(&clerkings, categorizer),
        substance_use: extract_contextual(notes, categorizer, KeywordSet::Substance),
        medications: medication_entries(&collaborators.medications.extract_medications(notes)),
        diagnoses: diagnosis_entries(&clerkings, notes, collaborators.diagnoses),
        risk,
        risk_grading,
        clerkings,
    };

    tracing::info!(
        notes = notes.len(),
        episodes = episodes.len(),
        clerkings = import.clerkings.len(),
        background = import.background.len(),
        medical = import.medical_history.len(),
        psychiatric = import.psychiatric_history.len(),
        forensic = import.forensic_history.len(),
        risk = import.risk.len(),
        substance = import.substance_use.len(),
        medications = import.medications.len(),
        diagnoses = import.diagnoses.len(),
        "Notes population complete"
    );

    import
}

//! Engine facade: owns the collaborators and configuration and exposes
//! the two directions (notes → sections, report → sections).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::ImportError;
use crate::models::ClinicalNote;
use crate::pipeline::keywords::KeywordCategorizer;
use crate::pipeline::notes::{populate_from_notes, NoteCollaborators, NotesImport};
use crate::pipeline::report::{is_report, parse_report, ReportImport};
use crate::pipeline::traits::{
    Categorizer, DiagnosisRecognizer, DocumentProcessor, MedicationExtractor, TimelineBuilder,
};

/// Result of importing a document: a parsed report, or notes routed
/// through the notes pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ImportOutcome {
    Report(ReportImport),
    Notes(NotesImport),
}

impl ImportOutcome {
    pub fn is_report(&self) -> bool {
        matches!(self, Self::Report(_))
    }
}

pub struct Engine {
    config: EngineConfig,
    timeline: Box<dyn TimelineBuilder>,
    medications: Box<dyn MedicationExtractor>,
    diagnoses: Box<dyn DiagnosisRecognizer>,
    categorizer: Box<dyn Categorizer>,
}

impl Engine {
    /// Engine with the built-in keyword categorizer.
    pub fn new(
        config: EngineConfig,
        timeline: Box<dyn TimelineBuilder>,
        medications: Box<dyn MedicationExtractor>,
        diagnoses: Box<dyn DiagnosisRecognizer>,
    ) -> Self {
        Self {
            config,
            timeline,
            medications,
            diagnoses,
            categorizer: Box::new(KeywordCategorizer::new()),
        }
    }

    pub fn with_categorizer(mut self, categorizer: Box<dyn Categorizer>) -> Self {
        self.categorizer = categorizer;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn populate_from_notes(&self, notes: &[ClinicalNote]) -> NotesImport {
        let collaborators = NoteCollaborators {
            timeline: self.timeline.as_ref(),
            medications: self.medications.as_ref(),
            diagnoses: self.diagnoses.as_ref(),
            categorizer: self.categorizer.as_ref(),
        };
        populate_from_notes(notes, &collaborators, &self.config)
    }

    /// Classify decoded text and route it. Text that is not recognisably a
    /// report is treated as notes.
    pub fn import_text(&self, text: &str, notes: &[ClinicalNote]) -> ImportOutcome {
        if is_report(text, notes, self.config.form_variant) {
            ImportOutcome::Report(parse_report(text, &self.config))
        } else {
            ImportOutcome::Notes(self.populate_from_notes(notes))
        }
    }

    /// Decode a document and import it. Decoding failure is the only error.
    pub fn import_document(
        &self,
        processor: &dyn DocumentProcessor,
        path: &Path,
    ) -> Result<ImportOutcome, ImportError> {
        let document = processor.process(path).map_err(|e| {
            tracing::warn!(error = %e, "Document processing failed");
            e
        })?;

        let mut outcome = self.import_text(&document.text, &document.notes);
        if let (ImportOutcome::Report(report), Some(info)) = (&mut outcome, document.patient_info) {
            if report.patient_details.is_empty() {
                report.patient_details = info;
            }
        }

        tracing::info!(
            report = outcome.is_report(),
            notes = document.notes.len(),
            "Document imported"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::DocumentError;
    use crate::models::{Episode, EpisodeType, Icd10Match, MedicationReport, ParseMode, ReportSection};
    use crate::pipeline::report::PatientDetails;
    use crate::pipeline::traits::ProcessedDocument;
    use chrono::{Duration, NaiveDate};

    pub(crate) struct FirstNoteEpisode;

    impl TimelineBuilder for FirstNoteEpisode {
        fn build_timeline(&self, notes: &[ClinicalNote]) -> Vec<Episode> {
            notes
                .iter()
                .map(|n| n.day())
                .min()
                .map(|start| Episode {
                    start,
                    end: start + Duration::days(30),
                    episode_type: EpisodeType::Inpatient,
                })
                .into_iter()
                .collect()
        }
    }

    pub(crate) struct NoMeds;

    impl MedicationExtractor for NoMeds {
        fn extract_medications(&self, _notes: &[ClinicalNote]) -> MedicationReport {
            MedicationReport::default()
        }
    }

    pub(crate) struct NoDiagnoses;

    impl DiagnosisRecognizer for NoDiagnoses {
        fn extract_icd10(&self, _text: &str) -> Vec<Icd10Match> {
            Vec::new()
        }
    }

    pub(crate) fn test_engine() -> Engine {
        Engine::new(
            EngineConfig::default(),
            Box::new(FirstNoteEpisode),
            Box::new(NoMeds),
            Box::new(NoDiagnoses),
        )
    }

    pub(crate) fn make_note(day: u32, body: &str) -> ClinicalNote {
        ClinicalNote {
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap().and_hms_opt(14, 0, 0).unwrap(),
            note_type: "Medical".into(),
            author: "Dr Green (CT2)".into(),
            body: body.into(),
        }
    }

    struct FixedDocument(Result<ProcessedDocument, ()>);

    impl DocumentProcessor for FixedDocument {
        fn process(&self, _path: &Path) -> Result<ProcessedDocument, DocumentError> {
            self.0.clone().map_err(|_| DocumentError::Decode("corrupt".into()))
        }
    }

    const NUMBERED_REPORT: &str = "1. Name: Sam Jones\n2. None required\n3. Nil forensic history known\n4. Known to CMHT\n5. Two previous admissions\n6. Relapsed after stopping medication";

    #[test]
    fn notes_routed_to_notes_path() {
        let notes = vec![make_note(1, "Forensic history: Caution 2019.\nPlan\nAdmit")];
        let outcome = test_engine().import_text("Forensic history: Caution 2019.", &notes);
        match outcome {
            ImportOutcome::Notes(import) => {
                assert_eq!(import.clerkings.len(), 1);
                assert_eq!(import.forensic_history[0].text, "Caution 2019.");
            }
            other => panic!("expected notes, got {other:?}"),
        }
    }

    #[test]
    fn report_routed_to_report_path() {
        let outcome = test_engine().import_text(NUMBERED_REPORT, &[]);
        match outcome {
            ImportOutcome::Report(report) => {
                assert_eq!(report.mode, ParseMode::Numbered);
                assert_eq!(report.patient_details.name.as_deref(), Some("Sam Jones"));
                assert!(report.sections.contains_key(&ReportSection::CurrentAdmission));
            }
            other => panic!("expected report, got {other:?}"),
        }
    }

    #[test]
    fn document_patient_info_fills_gaps() {
        let text = "Diagnosis\nSchizophrenia\nStrengths\nEngaged\nRecommendations\nRemain detained";
        let info = PatientDetails {
            name: Some("From OCR".into()),
            ..PatientDetails::default()
        };
        let processor = FixedDocument(Ok(ProcessedDocument {
            text: text.into(),
            notes: Vec::new(),
            patient_info: Some(info),
        }));
        let outcome = test_engine()
            .import_document(&processor, Path::new("report.txt"))
            .unwrap();
        match outcome {
            ImportOutcome::Report(report) => {
                assert_eq!(report.patient_details.name.as_deref(), Some("From OCR"));
            }
            other => panic!("expected report, got {other:?}"),
        }
    }

    #[test]
    fn decoding_failure_is_terminal_error() {
        let result = test_engine().import_document(&FixedDocument(Err(())), Path::new("x.pdf"));
        assert!(matches!(result, Err(ImportError::Document(DocumentError::Decode(_)))));
    }

    #[test]
    fn outcome_serializes_with_kind_tag() {
        let outcome = ImportOutcome::Notes(NotesImport::default());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "notes");
    }
}

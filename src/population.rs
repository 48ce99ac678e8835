//! Off-thread population and import with single-owner form state.
//!
//! Heavy work runs on the blocking pool; results come back as messages to
//! whoever owns the form. One in-flight flag per worker: a request made
//! while a pass is running is dropped, not queued.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::engine::{Engine, ImportOutcome};
use crate::error::ImportError;
use crate::models::{ClinicalNote, FormVariant, ImportedEntry, ReportSection};
use crate::pipeline::report::{PatientDetails, SectionMap};
use crate::pipeline::risk::RiskGrading;
use crate::pipeline::traits::DocumentProcessor;
use crate::session_cache::FormSnapshot;

/// Kind of pass a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Population,
    Import,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Population => "population",
            Self::Import => "import",
        }
    }
}

/// A finished pass, delivered to the form owner.
#[derive(Debug)]
pub struct PopulationMessage {
    pub form_id: Uuid,
    pub job_id: Uuid,
    pub kind: JobKind,
    pub outcome: Result<ImportOutcome, ImportError>,
}

pub struct PopulationWorker {
    engine: Arc<Engine>,
    in_flight: Arc<AtomicBool>,
    tx: mpsc::Sender<PopulationMessage>,
}

impl PopulationWorker {
    /// Worker plus the receiving end the form owner drains.
    pub fn new(engine: Arc<Engine>, buffer: usize) -> (Self, mpsc::Receiver<PopulationMessage>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let worker = Self {
            engine,
            in_flight: Arc::new(AtomicBool::new(false)),
            tx,
        };
        (worker, rx)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Populate a form from notes. Returns false if a pass is already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn request_population(&self, form_id: Uuid, notes: Vec<ClinicalNote>) -> bool {
        self.submit(form_id, JobKind::Population, move |engine| {
            Ok(ImportOutcome::Notes(engine.populate_from_notes(&notes)))
        })
    }

    /// Import already-decoded text. Returns false if a pass is already running.
    pub fn request_import(&self, form_id: Uuid, text: String, notes: Vec<ClinicalNote>) -> bool {
        self.submit(form_id, JobKind::Import, move |engine| {
            Ok(engine.import_text(&text, &notes))
        })
    }

    /// Decode and import a document. Returns false if a pass is already running.
    pub fn request_document_import(
        &self,
        form_id: Uuid,
        processor: Arc<dyn DocumentProcessor>,
        path: PathBuf,
    ) -> bool {
        self.submit(form_id, JobKind::Import, move |engine| {
            engine.import_document(processor.as_ref(), &path)
        })
    }

    fn submit<F>(&self, form_id: Uuid, kind: JobKind, work: F) -> bool
    where
        F: FnOnce(&Engine) -> Result<ImportOutcome, ImportError> + Send + 'static,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(%form_id, kind = kind.as_str(), "Pass in flight; request dropped");
            return false;
        }

        let job_id = Uuid::new_v4();
        let engine = Arc::clone(&self.engine);
        let in_flight = Arc::clone(&self.in_flight);
        let tx = self.tx.clone();
        tracing::info!(%form_id, %job_id, kind = kind.as_str(), "Pass started");

        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = match tokio::task::spawn_blocking(move || work(engine.as_ref())).await {
                Ok(result) => result,
                Err(e) => Err(ImportError::Worker(e.to_string())),
            };
            in_flight.store(false, Ordering::Release);

            tracing::info!(
                %form_id,
                %job_id,
                kind = kind.as_str(),
                ok = outcome.is_ok(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Pass finished"
            );

            let message = PopulationMessage {
                form_id,
                job_id,
                kind,
                outcome,
            };
            if tx.send(message).await.is_err() {
                tracing::warn!(%form_id, %job_id, "Form owner gone; result discarded");
            }
        });
        true
    }
}

/// Form state owned by a single thread. Results are applied whole.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    form_id: Uuid,
    variant: FormVariant,
    sections: SectionMap,
    entries: BTreeMap<ReportSection, Vec<ImportedEntry>>,
    risk_grading: RiskGrading,
    patient_details: PatientDetails,
    last_job: Option<Uuid>,
    last_error: Option<String>,
}

impl FormState {
    pub fn new(form_id: Uuid, variant: FormVariant) -> Self {
        Self {
            form_id,
            variant,
            sections: SectionMap::new(),
            entries: BTreeMap::new(),
            risk_grading: RiskGrading::default(),
            patient_details: PatientDetails::default(),
            last_job: None,
            last_error: None,
        }
    }

    pub fn form_id(&self) -> Uuid {
        self.form_id
    }

    pub fn variant(&self) -> FormVariant {
        self.variant
    }

    pub fn sections(&self) -> &SectionMap {
        &self.sections
    }

    pub fn entries(&self, section: ReportSection) -> &[ImportedEntry] {
        self.entries.get(&section).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn risk_grading(&self) -> &RiskGrading {
        &self.risk_grading
    }

    pub fn patient_details(&self) -> &PatientDetails {
        &self.patient_details
    }

    pub fn last_job(&self) -> Option<Uuid> {
        self.last_job
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Apply a finished pass. Messages for another form are ignored
    /// (returns false). A successful pass replaces all imported content:
    /// sections, entries, risk grading and patient details the pass does
    /// not produce are reset. A failed pass leaves content untouched and
    /// records the error.
    pub fn apply(&mut self, message: PopulationMessage) -> bool {
        if message.form_id != self.form_id {
            tracing::warn!(
                form_id = %self.form_id,
                message_form = %message.form_id,
                "Message for another form ignored"
            );
            return false;
        }
        self.last_job = Some(message.job_id);

        match message.outcome {
            Ok(ImportOutcome::Notes(import)) => {
                self.entries = self
                    .variant
                    .sections()
                    .iter()
                    .filter_map(|section| {
                        let entries = import.entries(*section);
                        (!entries.is_empty()).then(|| (*section, entries.to_vec()))
                    })
                    .collect();
                self.risk_grading = import.risk_grading;
                self.sections = SectionMap::new();
                self.patient_details = PatientDetails::default();
                self.last_error = None;
            }
            Ok(ImportOutcome::Report(report)) => {
                let mut entries: BTreeMap<ReportSection, Vec<ImportedEntry>> = BTreeMap::new();
                for (section, entry) in report.entries() {
                    if self.variant.includes(section) {
                        entries.entry(section).or_default().push(entry);
                    }
                }
                self.sections = report
                    .sections
                    .into_iter()
                    .filter(|(section, _)| self.variant.includes(*section))
                    .collect();
                self.entries = entries;
                self.patient_details = report.patient_details;
                self.risk_grading = RiskGrading::default();
                self.last_error = None;
            }
            Err(e) => {
                tracing::warn!(form_id = %self.form_id, error = %e, "Pass failed");
                self.last_error = Some(e.to_string());
            }
        }
        true
    }

    /// Toggle an entry's selection. Returns false for an unknown entry.
    pub fn toggle_selected(&mut self, section: ReportSection, index: usize) -> bool {
        match self.entries.get_mut(&section).and_then(|e| e.get_mut(index)) {
            Some(entry) => {
                entry.selected = !entry.selected;
                true
            }
            None => false,
        }
    }

    /// Set a section's text directly.
    pub fn set_section_text(&mut self, section: ReportSection, text: impl Into<String>) {
        self.sections.insert(section, text.into());
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            form_id: self.form_id,
            variant: self.variant,
            sections: self.sections.clone(),
            entries: self.entries.clone(),
            risk_grading: self.risk_grading.clone(),
            patient_details: self.patient_details.clone(),
            saved_at: chrono::Utc::now(),
        }
    }

    pub fn restore(snapshot: FormSnapshot) -> Self {
        Self {
            form_id: snapshot.form_id,
            variant: snapshot.variant,
            sections: snapshot.sections,
            entries: snapshot.entries,
            risk_grading: snapshot.risk_grading,
            patient_details: snapshot.patient_details,
            last_job: None,
            last_error: None,
        }
    }
}

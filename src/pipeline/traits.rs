//! Collaborator seams.
//!
//! The engine consumes these as pure functions:
//! - TimelineBuilder: notes → dated episodes
//! - MedicationExtractor: notes → drugs with dated mentions
//! - DiagnosisRecognizer: text → ICD-10 matches
//! - Categorizer: text → keyword categories, optionally with a highlighted context
//! - DocumentProcessor: file → decoded text and notes

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;
use crate::models::{ClinicalNote, Episode, Icd10Match, MedicationReport};
use crate::pipeline::report::PatientDetails;

pub trait TimelineBuilder: Send + Sync {
    fn build_timeline(&self, notes: &[ClinicalNote]) -> Vec<Episode>;
}

pub trait MedicationExtractor: Send + Sync {
    fn extract_medications(&self, notes: &[ClinicalNote]) -> MedicationReport;
}

pub trait DiagnosisRecognizer: Send + Sync {
    fn extract_icd10(&self, text: &str) -> Vec<Icd10Match>;
}

/// Keyword families known to the categorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordSet {
    Risk,
    Substance,
    Background,
    Diagnosis,
}

/// Categories found in a text plus the highlighted window they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedContext {
    pub context: String,
    pub categories: Vec<String>,
}

pub trait Categorizer: Send + Sync {
    fn categorize(&self, text: &str, set: KeywordSet) -> Vec<String>;

    fn categorize_with_context(&self, text: &str, set: KeywordSet) -> Option<CategorizedContext>;
}

/// Decoded document handed to the import path.
#[derive(Debug, Clone, Default)]
pub struct ProcessedDocument {
    pub text: String,
    pub notes: Vec<ClinicalNote>,
    pub patient_info: Option<PatientDetails>,
}

pub trait DocumentProcessor: Send + Sync {
    fn process(&self, path: &Path) -> Result<ProcessedDocument, DocumentError>;
}

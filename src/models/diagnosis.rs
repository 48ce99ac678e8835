use serde::{Deserialize, Serialize};

/// A diagnosis recognised in free text by the ICD-10 collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Icd10Match {
    pub code: String,
    pub raw_text: String,
    pub context: String,
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Output of the medication extractor collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicationReport {
    pub drugs: Vec<ExtractedDrug>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDrug {
    pub name: String,
    pub category: String,
    pub psychiatric_subtype: Option<String>,
    pub mentions: Vec<DrugMention>,
}

impl ExtractedDrug {
    /// Most recent mention; ties keep the later one in input order.
    pub fn latest_mention(&self) -> Option<&DrugMention> {
        self.mentions.iter().max_by_key(|m| m.date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugMention {
    pub date: NaiveDateTime,
    pub dose: Option<String>,
    pub frequency: Option<String>,
    pub context: String,
}

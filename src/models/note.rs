use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::enums::EpisodeType;

/// A single entry from the patient's clinical note history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalNote {
    pub date: NaiveDateTime,
    /// Free-text note category ("Medical", "Nursing", "Ward round", ...).
    pub note_type: String,
    /// Free-text originator, often carrying a role ("Dr Smith (CT1)").
    pub author: String,
    pub body: String,
}

impl ClinicalNote {
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    /// Body length in characters, not bytes.
    pub fn body_len(&self) -> usize {
        self.body.chars().count()
    }
}

/// A continuous stay derived from the note history by the timeline builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub episode_type: EpisodeType,
}

impl Episode {
    pub fn is_inpatient(&self) -> bool {
        self.episode_type == EpisodeType::Inpatient
    }
}

/// A note accepted as the admission assessment for an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clerking {
    pub date: NaiveDateTime,
    pub text: String,
    /// Start of the owning episode, or the note's own day for global-fallback matches.
    pub admission_date: NaiveDate,
}

/// Sort a copy of the notes by date. Stable, so same-timestamp notes keep input order.
pub fn sorted_by_date(notes: &[ClinicalNote]) -> Vec<&ClinicalNote> {
    let mut sorted: Vec<&ClinicalNote> = notes.iter().collect();
    sorted.sort_by_key(|n| n.date);
    sorted
}

//! Clerking detection: finds the admission assessment note(s) per episode.
//!
//! Tiers, applied per inpatient episode until one yields candidates:
//! 1. Primary: clinician-authored note in the admission window carrying a
//!    clerking trigger phrase or a medical-role author.
//! 2. Fallback: any long note in the window with a history-section header.
//! 3. Global: only when no episode produced anything, any long note with a
//!    personal-history marker, keyed by its own date.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;

use crate::config::EngineConfig;
use crate::models::{sorted_by_date, ClinicalNote, Clerking, Episode};

/// Note-type fragments written by medical staff.
const CLINICIAN_NOTE_TYPES: &[&str] = &["med", "doctor", "clinician", "physician"];

const CLERKING_TRIGGERS: &[&str] = &[
    "admission clerking",
    "new admission",
    "circumstances of admission",
    "circumstances leading to admission",
    "admission assessment",
    "admission note",
    "medical clerking",
    "clerked",
    "history of presenting complaint",
    "reason for admission",
];

const ROLE_TRIGGERS: &[&str] = &[
    "sho", "ct1", "ct2", "ct3", "st4", "st5", "st6", "fy1", "fy2", "doctor", "registrar",
    "consultant", "psychiatrist",
];

/// Characters of body used in the de-duplication key.
const DEDUP_PREFIX_CHARS: usize = 120;

static HISTORY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:personal history|background history|past medical history|forensic history|mental state examination|mse)\b",
    )
    .expect("Invalid history header regex")
});

static PERSONAL_HISTORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpersonal history\b").expect("Invalid personal history regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClerkingTier {
    Primary,
    Fallback,
}

impl ClerkingTier {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn is_primary_clerking(note: &ClinicalNote) -> bool {
    let note_type = note.note_type.to_lowercase();
    if !contains_any(&note_type, CLINICIAN_NOTE_TYPES) {
        return false;
    }
    let body = note.body.to_lowercase();
    let author = note.author.to_lowercase();
    contains_any(&body, CLERKING_TRIGGERS) || contains_any(&author, ROLE_TRIGGERS)
}

fn is_history_note(note: &ClinicalNote, min_chars: usize) -> bool {
    note.body_len() > min_chars && HISTORY_HEADER.is_match(&note.body)
}

fn dedup_key(note: &ClinicalNote) -> (NaiveDate, String) {
    (note.day(), note.body.chars().take(DEDUP_PREFIX_CHARS).collect())
}

/// Accepted clerkings plus the keys already used.
struct Accepted {
    clerkings: Vec<Clerking>,
    seen: HashSet<(NaiveDate, String)>,
}

impl Accepted {
    fn push(&mut self, note: &ClinicalNote, admission_date: NaiveDate) -> bool {
        if !self.seen.insert(dedup_key(note)) {
            return false;
        }
        self.clerkings.push(Clerking {
            date: note.date,
            text: note.body.clone(),
            admission_date,
        });
        true
    }
}

/// Find the admission clerkings for every inpatient episode.
///
/// Output order follows episode order, then note date. Running twice on
/// the same input gives the same result.
pub fn find_clerkings(
    notes: &[ClinicalNote],
    episodes: &[Episode],
    config: &EngineConfig,
) -> Vec<Clerking> {
    let sorted = sorted_by_date(notes);
    let mut accepted = Accepted {
        clerkings: Vec::new(),
        seen: HashSet::new(),
    };

    for episode in episodes.iter().filter(|e| e.is_inpatient()) {
        let window_end = Duration::try_days(config.clerking_window_days)
            .and_then(|d| episode.start.checked_add_signed(d))
            .unwrap_or(NaiveDate::MAX);
        let in_window: Vec<&ClinicalNote> = sorted
            .iter()
            .copied()
            .filter(|n| n.day() >= episode.start && n.day() <= window_end)
            .collect();

        let primary: Vec<&ClinicalNote> = in_window
            .iter()
            .copied()
            .filter(|n| is_primary_clerking(n))
            .collect();

        let (tier, candidates) = if primary.is_empty() {
            let fallback: Vec<&ClinicalNote> = in_window
                .iter()
                .copied()
                .filter(|n| is_history_note(n, config.clerking_min_body_chars))
                .collect();
            (ClerkingTier::Fallback, fallback)
        } else {
            (ClerkingTier::Primary, primary)
        };

        let added = candidates
            .into_iter()
            .filter(|note| accepted.push(note, episode.start))
            .count();

        tracing::debug!(
            episode_start = %episode.start,
            tier = tier.as_str(),
            added,
            "Clerking tier resolved"
        );
    }

    if accepted.clerkings.is_empty() {
        for note in sorted.iter().copied().filter(|n| {
            n.body_len() > config.clerking_min_body_chars && PERSONAL_HISTORY.is_match(&n.body)
        }) {
            accepted.push(note, note.day());
        }
        tracing::debug!(
            added = accepted.clerkings.len(),
            "No episode clerkings; global personal-history fallback used"
        );
    }

    accepted.clerkings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EpisodeType;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_note(date: NaiveDate, note_type: &str, author: &str, body: &str) -> ClinicalNote {
        ClinicalNote {
            date: date.and_hms_opt(10, 30, 0).unwrap(),
            note_type: note_type.into(),
            author: author.into(),
            body: body.into(),
        }
    }

    fn inpatient(start: NaiveDate) -> Episode {
        Episode {
            start,
            end: start + Duration::days(60),
            episode_type: EpisodeType::Inpatient,
        }
    }

    fn long_history_body(header: &str) -> String {
        format!("{header}\n{}", "Grew up locally with two siblings. ".repeat(20))
    }

    #[test]
    fn primary_tier_needs_clinician_type_and_trigger() {
        let start = day(2024, 3, 1);
        let notes = vec![
            make_note(day(2024, 3, 2), "Medical", "Dr Jones", "New admission to ward. Circumstances of admission: found wandering."),
            make_note(day(2024, 3, 2), "Nursing", "RN Smith", "New admission settled on ward."),
        ];
        let clerkings = find_clerkings(&notes, &[inpatient(start)], &EngineConfig::default());
        assert_eq!(clerkings.len(), 1);
        assert!(clerkings[0].text.contains("found wandering"));
        assert_eq!(clerkings[0].admission_date, start);
    }

    #[test]
    fn primary_tier_accepts_role_author_without_trigger() {
        let start = day(2024, 3, 1);
        let notes = vec![make_note(day(2024, 3, 3), "Doctor's note", "A. Patel (CT1)", "Reviewed on ward.")];
        let clerkings = find_clerkings(&notes, &[inpatient(start)], &EngineConfig::default());
        assert_eq!(clerkings.len(), 1);
    }

    #[test]
    fn notes_outside_window_ignored() {
        let start = day(2024, 3, 1);
        let notes = vec![
            make_note(day(2024, 3, 12), "Medical", "Dr Jones", "New admission clerking."),
            make_note(day(2024, 2, 28), "Medical", "Dr Jones", "New admission clerking."),
        ];
        let config = EngineConfig::default();
        let clerkings = find_clerkings(&notes, &[inpatient(start)], &config);
        assert!(clerkings.is_empty());
    }

    #[test]
    fn window_end_is_inclusive() {
        let start = day(2024, 3, 1);
        let notes = vec![make_note(day(2024, 3, 11), "Medical", "Dr Jones", "Admission clerking.")];
        let clerkings = find_clerkings(&notes, &[inpatient(start)], &EngineConfig::default());
        assert_eq!(clerkings.len(), 1);
    }

    #[test]
    fn unvalidated_huge_window_does_not_overflow() {
        let start = day(2024, 3, 1);
        let notes = vec![make_note(day(2030, 1, 1), "Medical", "Dr Jones", "Admission clerking.")];
        let config = EngineConfig {
            clerking_window_days: i64::MAX,
            ..EngineConfig::default()
        };
        let clerkings = find_clerkings(&notes, &[inpatient(start)], &config);
        assert_eq!(clerkings.len(), 1);
        assert_eq!(clerkings[0].admission_date, start);
    }

    #[test]
    fn fallback_tier_used_when_primary_empty() {
        let start = day(2024, 3, 1);
        let notes = vec![
            make_note(day(2024, 3, 4), "Ward round", "MDT", &long_history_body("Forensic history")),
            make_note(day(2024, 3, 4), "Ward round", "MDT", "Forensic history\nShort."),
        ];
        let clerkings = find_clerkings(&notes, &[inpatient(start)], &EngineConfig::default());
        assert_eq!(clerkings.len(), 1);
        assert!(clerkings[0].text.len() > 500);
    }

    #[test]
    fn fallback_not_used_when_primary_found() {
        let start = day(2024, 3, 1);
        let notes = vec![
            make_note(day(2024, 3, 2), "Medical", "Dr Jones", "Admission clerking."),
            make_note(day(2024, 3, 4), "Ward round", "MDT", &long_history_body("Personal history")),
        ];
        let clerkings = find_clerkings(&notes, &[inpatient(start)], &EngineConfig::default());
        assert_eq!(clerkings.len(), 1);
        assert_eq!(clerkings[0].text, "Admission clerking.");
    }

    #[test]
    fn global_fallback_keys_by_own_date() {
        let note_day = day(2023, 6, 15);
        let notes = vec![make_note(note_day, "Letter", "Clinic", &long_history_body("Personal history"))];
        let clerkings = find_clerkings(&notes, &[], &EngineConfig::default());
        assert_eq!(clerkings.len(), 1);
        assert_eq!(clerkings[0].admission_date, note_day);
    }

    #[test]
    fn global_fallback_skipped_when_episode_found_something() {
        let start = day(2024, 3, 1);
        let notes = vec![
            make_note(day(2024, 3, 2), "Medical", "Dr Jones", "Admission clerking."),
            make_note(day(2023, 1, 1), "Letter", "Clinic", &long_history_body("Personal history")),
        ];
        let clerkings = find_clerkings(&notes, &[inpatient(start)], &EngineConfig::default());
        assert_eq!(clerkings.len(), 1);
    }

    #[test]
    fn overlapping_episodes_do_not_double_count() {
        let notes = vec![make_note(day(2024, 3, 5), "Medical", "Dr Jones", "Admission clerking.")];
        let episodes = vec![inpatient(day(2024, 3, 1)), inpatient(day(2024, 3, 3))];
        let clerkings = find_clerkings(&notes, &episodes, &EngineConfig::default());
        assert_eq!(clerkings.len(), 1);
        assert_eq!(clerkings[0].admission_date, day(2024, 3, 1));
    }

    #[test]
    fn non_inpatient_episodes_ignored() {
        let notes = vec![make_note(day(2024, 3, 2), "Medical", "Dr Jones", "Admission clerking.")];
        let episode = Episode {
            start: day(2024, 3, 1),
            end: day(2024, 3, 20),
            episode_type: EpisodeType::Other,
        };
        assert!(find_clerkings(&notes, &[episode], &EngineConfig::default()).is_empty());
    }

    #[test]
    fn detection_is_idempotent() {
        let start = day(2024, 3, 1);
        let notes = vec![
            make_note(day(2024, 3, 2), "Medical", "Dr Jones", "Admission clerking."),
            make_note(day(2024, 3, 2), "Medical", "Dr Jones", "Admission clerking."),
            make_note(day(2024, 3, 6), "Medical", "SHO", "Review."),
        ];
        let episodes = vec![inpatient(start)];
        let config = EngineConfig::default();
        let first = find_clerkings(&notes, &episodes, &config);
        let second = find_clerkings(&notes, &episodes, &config);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn mse_header_needs_word_boundary() {
        let body = format!("They took themselves to bed. {}", "Quiet evening. ".repeat(40));
        let note = make_note(day(2024, 1, 1), "Nursing", "RN", &body);
        assert!(!is_history_note(&note, 500));
    }
}

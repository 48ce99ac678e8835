//! Risk auto-population: grades current and historical severity per risk
//! type from dated, categorised incidents.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::models::{ImportedEntry, RiskType, Severity};

/// Category tag (lowercase) to risk type.
const CATEGORY_RISK_TYPES: &[(&str, RiskType)] = &[
    ("violence", RiskType::Violence),
    ("physical aggression", RiskType::Violence),
    ("assault", RiskType::Violence),
    ("verbal aggression", RiskType::VerbalAggression),
    ("self-harm", RiskType::SelfHarm),
    ("self harm", RiskType::SelfHarm),
    ("suicide", RiskType::Suicide),
    ("suicidal ideation", RiskType::Suicide),
    ("awol", RiskType::Awol),
    ("absconsion", RiskType::Awol),
    ("property damage", RiskType::PropertyDamage),
    ("sexual", RiskType::Sexual),
    ("substance misuse", RiskType::SubstanceMisuse),
];

/// Historical incidents per year above which severity is high.
const HISTORICAL_HIGH_PER_YEAR: f64 = 5.0;
/// Historical incidents per year below which severity is low.
const HISTORICAL_LOW_PER_YEAR: f64 = 1.0;
/// Current count at which severity is high.
const CURRENT_HIGH_COUNT: u32 = 3;

/// Severity per risk type. Types without incidents are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskGrading {
    pub current: BTreeMap<RiskType, Severity>,
    pub historical: BTreeMap<RiskType, Severity>,
}

pub fn risk_type_for_category(category: &str) -> Option<RiskType> {
    let lower = category.trim().to_lowercase();
    CATEGORY_RISK_TYPES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, risk)| *risk)
}

/// Grade incidents. `current_window_days` counts back from the latest incident.
pub fn grade_risks(incidents: &[ImportedEntry], current_window_days: i64) -> RiskGrading {
    let dated: Vec<(chrono::NaiveDateTime, &ImportedEntry)> = incidents
        .iter()
        .filter_map(|e| e.date.map(|d| (d, e)))
        .collect();

    let (Some(latest), Some(earliest)) = (
        dated.iter().map(|(d, _)| *d).max(),
        dated.iter().map(|(d, _)| *d).min(),
    ) else {
        return RiskGrading::default();
    };

    let cutoff = Duration::try_days(current_window_days)
        .and_then(|d| latest.checked_sub_signed(d))
        .unwrap_or(chrono::NaiveDateTime::MIN);
    let mut current_counts: BTreeMap<RiskType, u32> = BTreeMap::new();
    let mut historical_counts: BTreeMap<RiskType, u32> = BTreeMap::new();

    for (date, entry) in &dated {
        for risk in entry.categories.iter().filter_map(|c| risk_type_for_category(c)) {
            *historical_counts.entry(risk).or_default() += 1;
            if *date >= cutoff {
                *current_counts.entry(risk).or_default() += 1;
            }
        }
    }

    let span_days = (latest - earliest).num_days() as f64;
    let num_years = (span_days / 365.0).max(1.0);

    let current = current_counts
        .into_iter()
        .map(|(risk, count)| (risk, current_severity(risk, count)))
        .collect();
    let historical = historical_counts
        .into_iter()
        .map(|(risk, count)| (risk, historical_severity(count as f64 / num_years)))
        .collect();

    let grading = RiskGrading { current, historical };
    tracing::debug!(
        incidents = dated.len(),
        current_types = grading.current.len(),
        historical_types = grading.historical.len(),
        "Risk grading computed"
    );
    grading
}

fn current_severity(risk: RiskType, count: u32) -> Severity {
    if risk == RiskType::Awol || count >= CURRENT_HIGH_COUNT {
        Severity::High
    } else {
        Severity::Medium
    }
}

fn historical_severity(per_year: f64) -> Severity {
    if per_year > HISTORICAL_HIGH_PER_YEAR {
        Severity::High
    } else if per_year < HISTORICAL_LOW_PER_YEAR {
        Severity::Low
    } else {
        Severity::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn incident(date: NaiveDateTime, category: &str) -> ImportedEntry {
        ImportedEntry::new(Some(date), "incident", vec![category.to_string()])
    }

    #[test]
    fn single_recent_awol_is_high() {
        let grading = grade_risks(&[incident(at(2024, 5, 20), "AWOL")], 90);
        assert_eq!(grading.current.get(&RiskType::Awol), Some(&Severity::High));
    }

    #[test]
    fn two_recent_violence_incidents() {
        let incidents = vec![incident(at(2024, 5, 1), "Violence"), incident(at(2024, 5, 20), "Violence")];
        let grading = grade_risks(&incidents, 90);
        assert_eq!(grading.current.get(&RiskType::Violence), Some(&Severity::Medium));
        assert_eq!(grading.historical.get(&RiskType::Violence), Some(&Severity::Medium));
    }

    #[test]
    fn three_current_incidents_are_high() {
        let incidents = vec![
            incident(at(2024, 5, 1), "Self-harm"),
            incident(at(2024, 5, 2), "Self-harm"),
            incident(at(2024, 5, 3), "self harm"),
        ];
        let grading = grade_risks(&incidents, 90);
        assert_eq!(grading.current.get(&RiskType::SelfHarm), Some(&Severity::High));
    }

    #[test]
    fn old_incidents_only_count_historically() {
        let incidents = vec![
            incident(at(2020, 1, 1), "Violence"),
            incident(at(2024, 1, 1), "Verbal aggression"),
        ];
        let grading = grade_risks(&incidents, 90);
        assert!(!grading.current.contains_key(&RiskType::Violence));
        assert_eq!(grading.current.get(&RiskType::VerbalAggression), Some(&Severity::Medium));
        // One incident over four years is under one per year.
        assert_eq!(grading.historical.get(&RiskType::Violence), Some(&Severity::Low));
    }

    #[test]
    fn frequent_incidents_are_historically_high() {
        let incidents: Vec<ImportedEntry> = (1..=6).map(|d| incident(at(2024, 1, d), "Violence")).collect();
        let grading = grade_risks(&incidents, 90);
        assert_eq!(grading.historical.get(&RiskType::Violence), Some(&Severity::High));
    }

    #[test]
    fn unknown_categories_and_undated_entries_ignored() {
        let incidents = vec![
            incident(at(2024, 1, 1), "Weather"),
            ImportedEntry::new(None, "undated", vec!["Violence".into()]),
        ];
        let grading = grade_risks(&incidents, 90);
        assert!(grading.current.is_empty());
        assert!(grading.historical.is_empty());
    }

    #[test]
    fn oversized_window_counts_everything_as_current() {
        let incidents = vec![incident(at(2001, 1, 1), "Violence"), incident(at(2024, 1, 1), "Violence")];
        let grading = grade_risks(&incidents, i64::MAX);
        assert_eq!(grading.current.get(&RiskType::Violence), Some(&Severity::Medium));
    }

    #[test]
    fn empty_input_is_empty_grading() {
        assert_eq!(grade_risks(&[], 90), RiskGrading::default());
    }

    #[test]
    fn category_lookup_is_case_insensitive() {
        assert_eq!(risk_type_for_category(" AWOL "), Some(RiskType::Awol));
        assert_eq!(risk_type_for_category("Property damage"), Some(RiskType::PropertyDamage));
        assert_eq!(risk_type_for_category("arson"), None);
    }
}

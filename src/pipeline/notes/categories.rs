//! Per-section extraction pipelines over clerkings and the full note history.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::config::EngineConfig;
use crate::models::{sorted_by_date, ClinicalNote, Clerking, EntryOrder, ImportedEntry, MedicationReport};
use crate::pipeline::headings::{
    extract_section, BACKGROUND_HEADINGS, FORENSIC_HEADINGS, MEDICAL_HEADINGS, NOTE_HEADINGS,
    PSYCHIATRIC_HEADINGS,
};
use crate::pipeline::traits::{Categorizer, DiagnosisRecognizer, KeywordSet};

/// Physical-health and mental-state sections share vocabulary; a medical
/// history extract mentioning any of these is a mental state, not a PMH.
static PSYCHIATRIC_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:delusion|hallucinat|mood|mse\b|mental state|psychos|psychotic|paranoi|thought disorder|affect\b|insight)",
    )
    .expect("Invalid psychiatric term regex")
});

/// Notes built from the CPA review template repeat boilerplate headings.
const CPA_TEMPLATE_MARKERS: &[&str] = &[
    "relevant social history",
    "daily function",
    "current illegal drugs",
];

const BACKGROUND_TAG: &str = "Background";
const MEDICAL_TAG: &str = "Physical health";
const PSYCHIATRIC_TAG: &str = "Psychiatric history";
const FORENSIC_TAG: &str = "Forensic history";

/// A dated text source for the extractor.
struct Source<'a> {
    date: NaiveDateTime,
    text: &'a str,
}

fn clerking_sources(clerkings: &[Clerking]) -> Vec<Source<'_>> {
    clerkings
        .iter()
        .map(|c| Source { date: c.date, text: &c.text })
        .collect()
}

fn note_sources(notes: &[ClinicalNote]) -> Vec<Source<'_>> {
    sorted_by_date(notes)
        .into_iter()
        .map(|n| Source { date: n.date, text: &n.body })
        .collect()
}

/// Run the section extractor over every source, keeping unique texts that pass `keep`.
fn extract_matches(
    sources: &[Source<'_>],
    headings: &[&str],
    keep: impl Fn(&str) -> bool,
) -> Vec<(NaiveDateTime, String)> {
    let mut out: Vec<(NaiveDateTime, String)> = Vec::new();
    for source in sources {
        let Some(content) = extract_section(source.text, headings, &NOTE_HEADINGS) else {
            continue;
        };
        if keep(&content) && !out.iter().any(|(_, t)| *t == content) {
            out.push((source.date, content));
        }
    }
    out
}

fn tag(
    categorizer: &dyn Categorizer,
    text: &str,
    set: Option<KeywordSet>,
    default_tag: &str,
) -> Vec<String> {
    let categories = set
        .map(|s| categorizer.categorize(text, s))
        .unwrap_or_default();
    if categories.is_empty() {
        vec![default_tag.to_string()]
    } else {
        categories
    }
}

fn to_entries(
    matches: Vec<(NaiveDateTime, String)>,
    categorizer: &dyn Categorizer,
    set: Option<KeywordSet>,
    default_tag: &str,
) -> Vec<ImportedEntry> {
    matches
        .into_iter()
        .map(|(date, text)| {
            let categories = tag(categorizer, &text, set, default_tag);
            ImportedEntry::new(Some(date), text, categories)
        })
        .collect()
}

fn order_entries(entries: &mut [ImportedEntry], order: EntryOrder) {
    match order {
        EntryOrder::Longest => entries.sort_by_key(|e| std::cmp::Reverse(e.text.chars().count())),
        EntryOrder::Recency => entries.sort_by_key(|e| std::cmp::Reverse(e.date)),
    }
}

fn is_cpa_template(text: &str) -> bool {
    let lower = text.to_lowercase();
    CPA_TEMPLATE_MARKERS.iter().any(|m| lower.contains(m))
}

/// Background: clerkings first, then a broader pass over every non-template note.
pub fn extract_background(
    clerkings: &[Clerking],
    notes: &[ClinicalNote],
    categorizer: &dyn Categorizer,
    config: &EngineConfig,
) -> Vec<ImportedEntry> {
    let long_enough = |t: &str| t.chars().count() > config.background_min_chars;

    let mut matches = extract_matches(&clerking_sources(clerkings), BACKGROUND_HEADINGS, long_enough);

    let broad_sources: Vec<Source<'_>> = note_sources(notes)
        .into_iter()
        .filter(|s| !is_cpa_template(s.text))
        .collect();
    for (date, text) in extract_matches(&broad_sources, BACKGROUND_HEADINGS, long_enough) {
        if !matches.iter().any(|(_, t)| *t == text) {
            matches.push((date, text));
        }
    }

    let mut entries = to_entries(matches, categorizer, Some(KeywordSet::Background), BACKGROUND_TAG);
    order_entries(&mut entries, EntryOrder::Longest);
    if config.background_order == EntryOrder::Recency {
        order_entries(&mut entries, EntryOrder::Recency);
    }
    entries
}

/// Medical history from clerkings, falling back to all notes.
pub fn extract_medical_history(
    clerkings: &[Clerking],
    notes: &[ClinicalNote],
    categorizer: &dyn Categorizer,
) -> Vec<ImportedEntry> {
    let not_psychiatric = |t: &str| !PSYCHIATRIC_TERMS.is_match(t);

    let mut matches = extract_matches(&clerking_sources(clerkings), MEDICAL_HEADINGS, not_psychiatric);
    if matches.is_empty() {
        tracing::debug!("No medical history in clerkings; scanning all notes");
        matches = extract_matches(&note_sources(notes), MEDICAL_HEADINGS, not_psychiatric);
    }
    to_entries(matches, categorizer, None, MEDICAL_TAG)
}

pub fn extract_psychiatric_history(
    clerkings: &[Clerking],
    categorizer: &dyn Categorizer,
) -> Vec<ImportedEntry> {
    let matches = extract_matches(&clerking_sources(clerkings), PSYCHIATRIC_HEADINGS, |_| true);
    to_entries(matches, categorizer, Some(KeywordSet::Diagnosis), PSYCHIATRIC_TAG)
}

pub fn extract_forensic_history(
    clerkings: &[Clerking],
    categorizer: &dyn Categorizer,
) -> Vec<ImportedEntry> {
    let matches = extract_matches(&clerking_sources(clerkings), FORENSIC_HEADINGS, |_| true);
    to_entries(matches, categorizer, Some(KeywordSet::Risk), FORENSIC_TAG)
}

/// Keyword-context entries over every note (risk incidents, substance use).
pub fn extract_contextual(
    notes: &[ClinicalNote],
    categorizer: &dyn Categorizer,
    set: KeywordSet,
) -> Vec<ImportedEntry> {
    sorted_by_date(notes)
        .into_iter()
        .filter_map(|note| {
            let found = categorizer.categorize_with_context(&note.body, set)?;
            Some(ImportedEntry::new(Some(note.date), found.context, found.categories))
        })
        .collect()
}

/// One entry per drug from its most recent mention, newest first.
pub fn medication_entries(report: &MedicationReport) -> Vec<ImportedEntry> {
    let mut entries: Vec<ImportedEntry> = report
        .drugs
        .iter()
        .filter_map(|drug| {
            let mention = drug.latest_mention()?;
            let text = [Some(drug.name.as_str()), mention.dose.as_deref(), mention.frequency.as_deref()]
                .into_iter()
                .flatten()
                .filter(|s| !s.trim().is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            let mut categories = vec![drug.category.clone()];
            if let Some(subtype) = &drug.psychiatric_subtype {
                categories.push(subtype.clone());
            }
            Some(ImportedEntry::with_context(Some(mention.date), text, &mention.context, categories))
        })
        .collect();
    order_entries(&mut entries, EntryOrder::Recency);
    entries
}

/// ICD-10 diagnoses from clerkings (all notes if none), one per code, newest
/// first. Same-day diagnoses are ordered by code.
pub fn diagnosis_entries(
    clerkings: &[Clerking],
    notes: &[ClinicalNote],
    recognizer: &dyn DiagnosisRecognizer,
) -> Vec<ImportedEntry> {
    let mut found = collect_diagnoses(&clerking_sources(clerkings), recognizer);
    if found.is_empty() {
        found = collect_diagnoses(&note_sources(notes), recognizer);
    }
    let mut entries: Vec<ImportedEntry> = found.into_values().collect();
    order_entries(&mut entries, EntryOrder::Recency);
    entries
}

fn collect_diagnoses(
    sources: &[Source<'_>],
    recognizer: &dyn DiagnosisRecognizer,
) -> BTreeMap<String, ImportedEntry> {
    let mut by_code: BTreeMap<String, ImportedEntry> = BTreeMap::new();
    for source in sources {
        for m in recognizer.extract_icd10(source.text) {
            let code = m.code.trim().to_uppercase();
            if code.is_empty() {
                continue;
            }
            let newer = by_code
                .get(&code)
                .map_or(true, |existing| existing.date <= Some(source.date));
            if newer {
                let text = format!("{} ({code})", m.raw_text.trim());
                let entry = ImportedEntry::with_context(Some(source.date), text, &m.context, vec![code.clone()]);
                by_code.insert(code, entry);
            }
        }
    }
    by_code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DrugMention, ExtractedDrug, Icd10Match};
    use crate::pipeline::keywords::KeywordCategorizer;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    fn clerking(date: NaiveDateTime, text: &str) -> Clerking {
        Clerking {
            date,
            text: text.into(),
            admission_date: date.date(),
        }
    }

    fn note(date: NaiveDateTime, body: &str) -> ClinicalNote {
        ClinicalNote {
            date,
            note_type: "Medical".into(),
            author: "Dr".into(),
            body: body.into(),
        }
    }

    fn long_background(lead: &str) -> String {
        format!("{lead} {}", "He has a younger brother and was raised in Hull. ".repeat(6))
    }

    #[test]
    fn background_requires_minimum_length() {
        let cat = KeywordCategorizer::new();
        let clerkings = vec![
            clerking(at(2024, 1, 1), "Personal history: Born in Leeds.\nPlan\nReview"),
            clerking(at(2024, 1, 2), &format!("Personal history\n{}\nPlan\nReview", long_background("Born in York."))),
        ];
        let entries = extract_background(&clerkings, &[], &cat, &EngineConfig::default());
        assert_eq!(entries.len(), 1);
        assert!(entries[0].text.starts_with("Born in York."));
        assert!(entries[0].categories.contains(&"Childhood".to_string()));
    }

    #[test]
    fn background_broad_pass_skips_cpa_template() {
        let cat = KeywordCategorizer::new();
        let template = format!("CPA review\nRelevant social history\nPersonal history\n{}", long_background("Lives alone."));
        let prose = format!("Family history\n{}", long_background("Mother had depression."));
        let notes = vec![note(at(2024, 2, 1), &template), note(at(2024, 2, 2), &prose)];
        let entries = extract_background(&[], &notes, &cat, &EngineConfig::default());
        assert_eq!(entries.len(), 1);
        assert!(entries[0].text.starts_with("Mother had depression."));
    }

    #[test]
    fn background_sorted_longest_first_or_by_recency() {
        let cat = KeywordCategorizer::new();
        let short = format!("Personal history\n{}", long_background("Older."));
        let long = format!("Personal history\n{}\n{}", long_background("Newer."), long_background("More."));
        let notes = vec![note(at(2024, 3, 1), &long), note(at(2024, 4, 1), &short)];

        let by_length = extract_background(&[], &notes, &cat, &EngineConfig::default());
        assert!(by_length[0].text.starts_with("Newer."));

        let config = EngineConfig {
            background_order: EntryOrder::Recency,
            ..EngineConfig::default()
        };
        let by_date = extract_background(&[], &notes, &cat, &config);
        assert!(by_date[0].text.starts_with("Older."));
    }

    #[test]
    fn medical_history_rejects_mental_state_text() {
        let cat = KeywordCategorizer::new();
        let clerkings = vec![
            clerking(at(2024, 1, 1), "Physical health: Mood low, no delusions.\nPlan\nx"),
            clerking(at(2024, 1, 2), "Past medical history\nAsthma since childhood.\nType 2 diabetes.\nPlan\nx"),
        ];
        let entries = extract_medical_history(&clerkings, &[], &cat);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "Asthma since childhood.\nType 2 diabetes.");
        assert_eq!(entries[0].categories, vec![MEDICAL_TAG.to_string()]);
    }

    #[test]
    fn medical_history_falls_back_to_all_notes() {
        let cat = KeywordCategorizer::new();
        let clerkings = vec![clerking(at(2024, 1, 1), "No relevant headings here.")];
        let notes = vec![note(at(2024, 5, 1), "PMH: Epilepsy, well controlled.")];
        let entries = extract_medical_history(&clerkings, &notes, &cat);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "Epilepsy, well controlled.");
    }

    #[test]
    fn psychiatric_and_forensic_tagging() {
        let cat = KeywordCategorizer::new();
        let clerkings = vec![clerking(
            at(2024, 1, 1),
            "Past psychiatric history\nDiagnosed with schizophrenia in 2015.\nForensic history\nConvicted of assault 2018.\nPlan\nReview",
        )];
        let psych = extract_psychiatric_history(&clerkings, &cat);
        assert_eq!(psych.len(), 1);
        assert_eq!(psych[0].categories, vec!["Psychosis".to_string()]);

        let forensic = extract_forensic_history(&clerkings, &cat);
        assert_eq!(forensic.len(), 1);
        assert_eq!(forensic[0].text, "Convicted of assault 2018.");
        assert_eq!(forensic[0].categories, vec!["Violence".to_string()]);
    }

    #[test]
    fn forensic_default_tag_when_no_keywords() {
        let cat = KeywordCategorizer::new();
        let clerkings = vec![clerking(at(2024, 1, 1), "Forensic history: Nil known.")];
        let forensic = extract_forensic_history(&clerkings, &cat);
        assert_eq!(forensic[0].categories, vec![FORENSIC_TAG.to_string()]);
    }

    #[test]
    fn contextual_entries_cover_every_note() {
        let cat = KeywordCategorizer::new();
        let notes = vec![
            note(at(2024, 1, 2), "Punched a peer in the lounge."),
            note(at(2024, 1, 1), "Settled day."),
            note(at(2024, 1, 3), "Went AWOL from escorted leave."),
        ];
        let risk = extract_contextual(&notes, &cat, KeywordSet::Risk);
        assert_eq!(risk.len(), 2);
        assert_eq!(risk[0].date, Some(at(2024, 1, 2)));
        assert_eq!(risk[1].categories, vec!["AWOL".to_string()]);
    }

    #[test]
    fn medication_entries_use_latest_mention() {
        let report = MedicationReport {
            drugs: vec![
                ExtractedDrug {
                    name: "Clozapine".into(),
                    category: "Antipsychotic".into(),
                    psychiatric_subtype: Some("Atypical".into()),
                    mentions: vec![
                        DrugMention { date: at(2024, 1, 1), dose: Some("100mg".into()), frequency: Some("nocte".into()), context: "Clozapine 100mg nocte".into() },
                        DrugMention { date: at(2024, 2, 1), dose: Some("200mg".into()), frequency: Some("nocte".into()), context: "Clozapine titrated to 200mg nocte".into() },
                    ],
                },
                ExtractedDrug {
                    name: "Sertraline".into(),
                    category: "Antidepressant".into(),
                    psychiatric_subtype: None,
                    mentions: vec![DrugMention { date: at(2024, 3, 1), dose: None, frequency: None, context: "Started sertraline".into() }],
                },
                ExtractedDrug {
                    name: "Unmentioned".into(),
                    category: "Other".into(),
                    psychiatric_subtype: None,
                    mentions: vec![],
                },
            ],
        };
        let entries = medication_entries(&report);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "Sertraline");
        assert_eq!(entries[1].text, "Clozapine 200mg nocte");
        assert_eq!(entries[1].categories, vec!["Antipsychotic".to_string(), "Atypical".to_string()]);
    }

    struct FakeIcd;

    impl DiagnosisRecognizer for FakeIcd {
        fn extract_icd10(&self, text: &str) -> Vec<Icd10Match> {
            let mut out = Vec::new();
            if text.contains("schizophrenia") {
                out.push(Icd10Match {
                    code: "f20.0".into(),
                    raw_text: "Paranoid schizophrenia".into(),
                    context: "paranoid schizophrenia".into(),
                });
            }
            if text.contains("depression") {
                out.push(Icd10Match {
                    code: "F32.1".into(),
                    raw_text: "Depressive episode".into(),
                    context: "depression".into(),
                });
            }
            if text.contains("alcohol") {
                out.push(Icd10Match {
                    code: "F10.2".into(),
                    raw_text: "Alcohol dependence".into(),
                    context: "alcohol".into(),
                });
            }
            out
        }
    }

    #[test]
    fn diagnoses_deduplicated_by_code_keeping_latest() {
        let clerkings = vec![
            clerking(at(2022, 1, 1), "Known schizophrenia."),
            clerking(at(2024, 1, 1), "Relapse of schizophrenia."),
        ];
        let entries = diagnosis_entries(&clerkings, &[], &FakeIcd);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].date, Some(at(2024, 1, 1)));
        assert_eq!(entries[0].text, "Paranoid schizophrenia (F20.0)");
        assert_eq!(entries[0].categories, vec!["F20.0".to_string()]);
    }

    #[test]
    fn same_day_diagnoses_ordered_by_code() {
        let clerkings = vec![clerking(at(2024, 1, 1), "schizophrenia with depression and alcohol use")];
        let codes: Vec<String> = diagnosis_entries(&clerkings, &[], &FakeIcd)
            .into_iter()
            .map(|e| e.categories[0].clone())
            .collect();
        assert_eq!(codes, vec!["F10.2", "F20.0", "F32.1"]);
    }

    #[test]
    fn diagnoses_fall_back_to_notes() {
        let notes = vec![note(at(2024, 1, 1), "Diagnosis: schizophrenia")];
        let entries = diagnosis_entries(&[], &notes, &FakeIcd);
        assert_eq!(entries.len(), 1);
    }
}

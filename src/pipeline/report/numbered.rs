//! Numbered-question (T131) report parsing.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::sanitize::{answer_after_question, clean_block, is_template_question};
use super::SectionMap;
use crate::config::EngineConfig;
use crate::models::ReportSection;

/// Question number → canonical section and the sub-header used when several
/// questions share a section.
static T131_QUESTIONS: &[(u32, ReportSection, &str)] = &[
    (1, ReportSection::PatientDetails, "Patient details"),
    (2, ReportSection::Adjustments, "Factors affecting the hearing"),
    (3, ReportSection::Forensic, "Index offence and forensic history"),
    (4, ReportSection::PreviousInvolvement, "Previous involvement with services"),
    (5, ReportSection::PreviousAdmissions, "Previous admissions"),
    (6, ReportSection::CurrentAdmission, "Circumstances of current admission"),
    (7, ReportSection::Diagnosis, "Mental disorder"),
    (8, ReportSection::LearningDisability, "Learning disability"),
    (9, ReportSection::DetentionRequired, "Detention required"),
    (10, ReportSection::Treatment, "Medical treatment"),
    (11, ReportSection::Strengths, "Strengths"),
    (12, ReportSection::Progress, "Current progress"),
    (13, ReportSection::Compliance, "Understanding and compliance"),
    (14, ReportSection::Treatment, "Deprivation of liberty"),
    (15, ReportSection::Background, "Background information"),
    (16, ReportSection::MedicalHistory, "Physical health"),
    (17, ReportSection::Risk, "Incidents of harm to self or others"),
    (18, ReportSection::Risk, "Incidents of damage to property"),
    (19, ReportSection::LegalCriteria, "Section 2 criteria"),
    (20, ReportSection::LegalCriteria, "Section 3 criteria"),
    (21, ReportSection::Discharge, "Risk if discharged"),
    (22, ReportSection::Discharge, "Community risk management"),
    (23, ReportSection::Recommendations, "Recommendations"),
    (24, ReportSection::Signature, "Signature"),
];

/// Highest question number on the form.
pub const T131_LAST_QUESTION: u32 = 24;

/// Largest number a numbered list may open with.
const FIRST_QUESTION_MAX: u32 = 5;

static RUN_ON_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,2}\. [A-Z]").expect("Invalid run-on number regex"));

static QUESTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)[.)]\s*(.*)$").expect("Invalid question line regex"));

pub fn question_section(number: u32) -> Option<(ReportSection, &'static str)> {
    T131_QUESTIONS
        .iter()
        .find(|(n, _, _)| *n == number)
        .map(|(_, section, label)| (*section, *label))
}

/// Put every run-on "N. Capital" answer on its own line.
fn split_run_on(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;
    for m in RUN_ON_NUMBER.find_iter(text) {
        let line_start = text[..m.start()].rfind('\n').map_or(0, |i| i + 1);
        if text[line_start..m.start()].trim().is_empty() {
            continue;
        }
        out.push_str(text[last..m.start()].trim_end_matches(|c: char| c == ' ' || c == '\t'));
        out.push('\n');
        last = m.start();
    }
    out.push_str(&text[last..]);
    out
}

fn accepts(previous: Option<u32>, number: u32, max_jump: u32) -> bool {
    match previous {
        None => (1..=FIRST_QUESTION_MAX).contains(&number),
        Some(prev) => number > prev && number - prev <= max_jump,
    }
}

/// Split text into numbered questions. Numbers that break the sequence are
/// kept as text of the current question.
pub fn split_questions(text: &str, max_jump: u32) -> BTreeMap<u32, String> {
    let prepared = split_run_on(text);
    let mut questions: BTreeMap<u32, Vec<&str>> = BTreeMap::new();
    let mut current: Option<u32> = None;

    for line in prepared.lines() {
        let marker = QUESTION_LINE
            .captures(line)
            .and_then(|caps| {
                let number = caps.get(1)?.as_str().parse::<u32>().ok()?;
                let rest = caps.get(2).map_or("", |m| m.as_str());
                Some((number, rest))
            })
            .filter(|(number, _)| accepts(current, *number, max_jump));

        match (marker, current) {
            (Some((number, rest)), _) => {
                current = Some(number);
                let answer = if is_template_question(line) {
                    answer_after_question(rest)
                } else {
                    rest
                };
                let lines = questions.entry(number).or_default();
                if !answer.is_empty() {
                    lines.push(answer);
                }
            }
            (None, Some(number)) => questions.entry(number).or_default().push(line),
            // Preamble before the first question.
            (None, None) => {}
        }
    }

    questions
        .into_iter()
        .map(|(number, lines)| (number, clean_block(&lines.join("\n"))))
        .filter(|(_, text)| !text.is_empty())
        .collect()
}

/// Parse a numbered report. `None` when too few questions are recovered.
pub fn parse_numbered(text: &str, config: &EngineConfig) -> Option<SectionMap> {
    let questions = split_questions(text, config.numbered_max_jump);
    if questions.len() < config.numbered_min_sections {
        tracing::debug!(
            questions = questions.len(),
            required = config.numbered_min_sections,
            "Numbered mode rejected"
        );
        return None;
    }

    let mut grouped: BTreeMap<ReportSection, Vec<(&'static str, String)>> = BTreeMap::new();
    for (number, answer) in questions {
        let Some((section, label)) = question_section(number) else {
            continue;
        };
        if !config.form_variant.includes(section) {
            continue;
        }
        grouped.entry(section).or_default().push((label, answer));
    }

    let sections: SectionMap = grouped
        .into_iter()
        .map(|(section, answers)| {
            let text = if answers.len() == 1 {
                answers.into_iter().map(|(_, a)| a).collect::<String>()
            } else {
                answers
                    .into_iter()
                    .map(|(label, a)| format!("**{label}**\n{a}"))
                    .collect::<Vec<_>>()
                    .join("\n\n")
            };
            (section, text)
        })
        .collect();

    Some(sections)
}

//! Field extraction over a report's patient-details section.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Patient fields recovered from a report. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDetails {
    pub name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub mha_section: Option<String>,
    pub location: Option<String>,
    pub admission_date: Option<NaiveDate>,
}

impl PatientDetails {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

static NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:patient(?:'s)?\s+)?(?:full\s+)?name\s*[:\-]\s*(.+?)\s*$")
        .expect("Invalid name regex")
});

static DOB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)\b(?:d\.?o\.?b\.?|date of birth)\s*[:\-]?\s*(.+)$").expect("Invalid DOB regex")
});

static GENDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)\b(?:gender|sex)\s*[:\-]\s*(male|female|man|woman|non-binary|other)\b")
        .expect("Invalid gender regex")
});

static GENDER_FALLBACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d{1,3}\s*(?:yo|y/o|year[- ]old)\s+(male|female|man|woman)\b")
        .expect("Invalid gender fallback regex")
});

static MHA_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:section|s\.?)\s*(5\(2\)|(?:2|3|37/41|37|41|47/49|48/49|47|48|17a|136|135)\b)")
        .expect("Invalid MHA section regex")
});

static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:ward|hospital|location|current location)\s*[:\-]\s*(.+?)\s*$")
        .expect("Invalid location regex")
});

static ADMISSION_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)\b(?:date of admission|admission date|admitted(?: on)?)\s*[:\-]?\s*(.+)$")
        .expect("Invalid admission date regex")
});

static ORDINAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("Invalid ordinal regex"));

static DATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\d{4}-\d{1,2}-\d{1,2}|\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4}|\d{1,2}\s+[A-Za-z]{3,9}\s+\d{4}",
    )
    .expect("Invalid date token regex")
});

/// Parse a date as written in a report: ISO, day-first numeric with `/`,
/// `-` or `.`, or textual with an optional ordinal ("1st January 1990").
pub fn parse_report_date(raw: &str) -> Option<NaiveDate> {
    let normalized = ORDINAL_SUFFIX.replace_all(raw, "$1");
    let normalized = normalized.replace(" of ", " ").replace(',', " ");
    let token = DATE_TOKEN.find(&normalized)?.as_str();
    let token = token.split_whitespace().collect::<Vec<_>>().join(" ");

    const FORMATS: &[&str] = &[
        "%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%d/%m/%y", "%d-%m-%y", "%d.%m.%y",
        "%d %B %Y", "%d %b %Y",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&token, fmt).ok())
}

fn capture(regex: &Regex, text: &str) -> Option<String> {
    regex
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn normalize_gender(raw: &str) -> String {
    match raw.to_lowercase().as_str() {
        "male" | "man" => "Male".to_string(),
        "female" | "woman" => "Female".to_string(),
        other => other.to_string(),
    }
}

/// Pull patient fields from the patient-details text of a report.
pub fn extract_patient_details(text: &str) -> PatientDetails {
    let gender = capture(&GENDER, text)
        .or_else(|| capture(&GENDER_FALLBACK, text))
        .map(|g| normalize_gender(&g));

    let details = PatientDetails {
        name: capture(&NAME, text),
        date_of_birth: capture(&DOB, text).and_then(|d| parse_report_date(&d)),
        gender,
        mha_section: capture(&MHA_SECTION, text).map(|s| format!("Section {}", s.to_uppercase())),
        location: capture(&LOCATION, text),
        admission_date: capture(&ADMISSION_DATE, text).and_then(|d| parse_report_date(&d)),
    };

    tracing::debug!(
        name = details.name.is_some(),
        dob = details.date_of_birth.is_some(),
        gender = details.gender.is_some(),
        section = details.mha_section.is_some(),
        location = details.location.is_some(),
        admission = details.admission_date.is_some(),
        "Patient details extracted"
    );
    details
}

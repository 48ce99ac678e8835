use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unknown string for a string-backed enum.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct ParseEnumError {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ParseEnumError {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(ReportSection {
    PatientDetails => "patient_details",
    Adjustments => "adjustments",
    Forensic => "forensic",
    PreviousInvolvement => "previous_involvement",
    PreviousAdmissions => "previous_admissions",
    CurrentAdmission => "current_admission",
    Diagnosis => "diagnosis",
    LearningDisability => "learning_disability",
    DetentionRequired => "detention_required",
    Treatment => "treatment",
    Strengths => "strengths",
    Progress => "progress",
    Compliance => "compliance",
    Background => "background",
    MedicalHistory => "medical_history",
    SubstanceUse => "substance_use",
    Risk => "risk",
    LegalCriteria => "legal_criteria",
    Discharge => "discharge",
    Recommendations => "recommendations",
    Signature => "signature",
});

impl ReportSection {
    /// Heading printed on the exported report.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PatientDetails => "Patient Details",
            Self::Adjustments => "Factors Affecting the Hearing",
            Self::Forensic => "Forensic History",
            Self::PreviousInvolvement => "Previous Involvement with Services",
            Self::PreviousAdmissions => "Previous Admissions",
            Self::CurrentAdmission => "Circumstances of Current Admission",
            Self::Diagnosis => "Mental Disorder and Diagnosis",
            Self::LearningDisability => "Learning Disability",
            Self::DetentionRequired => "Detention Required",
            Self::Treatment => "Medical Treatment",
            Self::Strengths => "Strengths",
            Self::Progress => "Current Progress",
            Self::Compliance => "Understanding and Compliance",
            Self::Background => "Background Information",
            Self::MedicalHistory => "Physical Health",
            Self::SubstanceUse => "Substance Use",
            Self::Risk => "Risk",
            Self::LegalCriteria => "Legal Criteria",
            Self::Discharge => "Risk if Discharged",
            Self::Recommendations => "Recommendations",
            Self::Signature => "Signature",
        }
    }
}

str_enum!(FormVariant {
    Full => "full",
    Compact => "compact",
});

impl FormVariant {
    /// Canonical sections a form of this variant carries, in report order.
    pub fn sections(&self) -> &'static [ReportSection] {
        match self {
            Self::Full => ReportSection::ALL,
            Self::Compact => &[
                ReportSection::PatientDetails,
                ReportSection::Forensic,
                ReportSection::PreviousInvolvement,
                ReportSection::CurrentAdmission,
                ReportSection::Diagnosis,
                ReportSection::Treatment,
                ReportSection::Strengths,
                ReportSection::Progress,
                ReportSection::Background,
                ReportSection::MedicalHistory,
                ReportSection::SubstanceUse,
                ReportSection::Risk,
                ReportSection::Recommendations,
                ReportSection::Signature,
            ],
        }
    }

    pub fn includes(&self, section: ReportSection) -> bool {
        self.sections().contains(&section)
    }
}

impl Default for FormVariant {
    fn default() -> Self {
        Self::Full
    }
}

str_enum!(EpisodeType {
    Inpatient => "inpatient",
    Other => "other",
});

str_enum!(RiskType {
    Violence => "violence",
    VerbalAggression => "verbal_aggression",
    SelfHarm => "self_harm",
    Suicide => "suicide",
    Awol => "awol",
    PropertyDamage => "property_damage",
    Sexual => "sexual",
    SubstanceMisuse => "substance_misuse",
});

str_enum!(Severity {
    None => "none",
    Low => "low",
    Medium => "medium",
    High => "high",
});

str_enum!(ParseMode {
    Numbered => "numbered",
    Headings => "headings",
    Empty => "empty",
});

str_enum!(EntryOrder {
    Longest => "longest",
    Recency => "recency",
});

impl Default for EntryOrder {
    fn default() -> Self {
        Self::Longest
    }
}

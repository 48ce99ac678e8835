use std::sync::LazyLock;

use regex::Regex;

use super::traits::{CategorizedContext, Categorizer, KeywordSet};

/// A category and the compiled alternation of its keywords.
struct KeywordCategory {
    category: &'static str,
    regex: Regex,
}

fn category(category: &'static str, keywords: &[&str]) -> KeywordCategory {
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    KeywordCategory {
        category,
        regex: Regex::new(&format!(r"(?i)\b(?:{alternation})")).expect("Invalid keyword regex"),
    }
}

static RISK_KEYWORDS: LazyLock<Vec<KeywordCategory>> = LazyLock::new(|| {
    vec![
        category("Violence", &["assault", "punched", "kicked", "headbutt", "physically aggressive", "violent", "hit a member of staff", "hit staff", "restrained"]),
        category("Verbal aggression", &["verbally aggressive", "verbal aggression", "verbally abusive", "threatened", "threatening"]),
        category("Self-harm", &["self-harm", "self harm", "cut her", "cut his", "ligature", "head banging"]),
        category("Suicide", &["suicidal", "suicide attempt", "overdose", "attempted suicide"]),
        category("AWOL", &["awol", "absconded", "absconsion", "failed to return", "went missing"]),
        category("Property damage", &["damaged property", "property damage", "smashed", "broke a window", "kicked the door"]),
        category("Sexual", &["sexually inappropriate", "sexual disinhibition", "exposed himself", "exposed herself"]),
    ]
});

static SUBSTANCE_KEYWORDS: LazyLock<Vec<KeywordCategory>> = LazyLock::new(|| {
    vec![
        category("Alcohol", &["alcohol", "etoh", "drinking", "intoxicated", "units per"]),
        category("Cannabis", &["cannabis", "thc", "skunk", "weed"]),
        category("Cocaine", &["cocaine", "crack"]),
        category("Opiates", &["heroin", "opiate", "opioid", "methadone"]),
        category("Stimulants", &["amphetamine", "speed", "mdma", "ecstasy"]),
        category("NPS", &["spice", "novel psychoactive", "legal high"]),
    ]
});

static BACKGROUND_KEYWORDS: LazyLock<Vec<KeywordCategory>> = LazyLock::new(|| {
    vec![
        category("Childhood", &["born in", "raised by", "childhood", "grew up"]),
        category("Education", &["school", "college", "university", "qualifications"]),
        category("Employment", &["employed", "unemployed", "worked as", "job"]),
        category("Relationships", &["married", "divorced", "partner", "children"]),
        category("Trauma", &["abuse", "trauma", "neglect", "bereavement"]),
    ]
});

static DIAGNOSIS_KEYWORDS: LazyLock<Vec<KeywordCategory>> = LazyLock::new(|| {
    vec![
        category("Psychosis", &["schizophrenia", "schizoaffective", "psychosis", "psychotic"]),
        category("Mood disorder", &["bipolar", "depressive disorder", "depression", "mania"]),
        category("Personality disorder", &["personality disorder", "eupd", "dissocial"]),
        category("Neurodevelopmental", &["autism", "asd", "adhd", "learning disability"]),
    ]
});

fn table(set: KeywordSet) -> &'static [KeywordCategory] {
    match set {
        KeywordSet::Risk => &RISK_KEYWORDS,
        KeywordSet::Substance => &SUBSTANCE_KEYWORDS,
        KeywordSet::Background => &BACKGROUND_KEYWORDS,
        KeywordSet::Diagnosis => &DIAGNOSIS_KEYWORDS,
    }
}

fn categories_in(text: &str, set: KeywordSet) -> Vec<String> {
    table(set)
        .iter()
        .filter(|kc| kc.regex.is_match(text))
        .map(|kc| kc.category.to_string())
        .collect()
}

/// Wrap every keyword hit from `set` in `**`.
fn highlight(text: &str, set: KeywordSet) -> String {
    let mut out = text.to_string();
    for kc in table(set) {
        out = kc.regex.replace_all(&out, "**$0**").into_owned();
    }
    out
}

/// Static keyword-table categorizer.
///
/// The context window is the first matching line with one line of
/// context either side.
pub struct KeywordCategorizer;

impl KeywordCategorizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for KeywordCategorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Categorizer for KeywordCategorizer {
    fn categorize(&self, text: &str, set: KeywordSet) -> Vec<String> {
        categories_in(text, set)
    }

    fn categorize_with_context(&self, text: &str, set: KeywordSet) -> Option<CategorizedContext> {
        let lines: Vec<&str> = text.lines().collect();
        let first = lines.iter().position(|l| !categories_in(l, set).is_empty())?;

        let mut categories: Vec<String> = Vec::new();
        for line in &lines {
            for c in categories_in(line, set) {
                if !categories.contains(&c) {
                    categories.push(c);
                }
            }
        }

        let from = first.saturating_sub(1);
        let to = (first + 2).min(lines.len());
        let window = lines[from..to]
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Some(CategorizedContext {
            context: highlight(&window, set),
            categories,
        })
    }
}

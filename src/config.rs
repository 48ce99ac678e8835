//! Engine configuration.
//!
//! Tunable thresholds live in `EngineConfig`; the phrase and keyword
//! tables are policy and stay in static tables next to the code that
//! reads them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{EntryOrder, FormVariant};

/// Crate-level constants
pub const APP_NAME: &str = "clerking-import";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "clerking_import=info"
}

/// Upper bound for day windows (ten years).
pub const MAX_WINDOW_DAYS: i64 = 3650;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Days after an episode start in which its clerking may be written.
    pub clerking_window_days: i64,
    /// Body length a fallback clerking must exceed.
    pub clerking_min_body_chars: usize,
    /// Length a background extract must exceed.
    pub background_min_chars: usize,
    /// Minimum content length for report-side section extraction.
    pub report_min_section_chars: usize,
    /// A heading-mode heading must start within this many characters of the line start.
    pub heading_prefix_window: usize,
    /// Numbered mode fails below this many recovered questions.
    pub numbered_min_sections: usize,
    /// Largest forward jump accepted between question numbers.
    pub numbered_max_jump: u32,
    /// Incidents this close to the latest one count as current risk.
    pub current_risk_window_days: i64,
    pub form_variant: FormVariant,
    pub background_order: EntryOrder,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clerking_window_days: 10,
            clerking_min_body_chars: 500,
            background_min_chars: 200,
            report_min_section_chars: 20,
            heading_prefix_window: 5,
            numbered_min_sections: 6,
            numbered_max_jump: 4,
            current_risk_window_days: 90,
            form_variant: FormVariant::Full,
            background_order: EntryOrder::Longest,
        }
    }
}

impl EngineConfig {
    /// Parse overrides from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, days) in [
            ("clerking_window_days", self.clerking_window_days),
            ("current_risk_window_days", self.current_risk_window_days),
        ] {
            if !(1..=MAX_WINDOW_DAYS).contains(&days) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be between 1 and {MAX_WINDOW_DAYS}"
                )));
            }
        }
        for (name, value) in [
            ("clerking_min_body_chars", self.clerking_min_body_chars),
            ("background_min_chars", self.background_min_chars),
            ("report_min_section_chars", self.report_min_section_chars),
            ("heading_prefix_window", self.heading_prefix_window),
            ("numbered_min_sections", self.numbered_min_sections),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be > 0")));
            }
        }
        if self.numbered_max_jump == 0 {
            return Err(ConfigError::Invalid("numbered_max_jump must be > 0".into()));
        }
        Ok(())
    }
}

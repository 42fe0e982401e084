//! Configuration management
//!
//! Statement parsing thresholds live under the `statements` key of the host
//! application's settings.json:
//! ```json
//! {
//!   "statements": { "maxAiPages": 5, "recurring": { "minOccurrences": 2 } },
//!   "other": { ... }
//! }
//! ```
//! Missing keys fall back to defaults; unrelated keys are ignored.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};

/// Environment override for [`EngineConfig::max_ai_pages`]
pub const MAX_AI_PAGES_ENV: &str = "NETWORTH_MAX_AI_PAGES";

/// Raw settings.json structure; only the `statements` section is read
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    statements: EngineConfig,
}

/// Parser thresholds and confidence levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Aggregate embedded text must exceed this many characters before the line scan runs
    pub min_document_text_length: usize,
    /// Shorter document lines are never transaction candidates
    pub min_line_length: usize,
    /// Upper bound on pages rasterized and sent to the vision collaborator
    pub max_ai_pages: usize,
    /// Data rows sampled for column inference and the date-order hint
    pub sample_rows: usize,
    /// Confidence of records found by the document line scan
    pub text_confidence: f64,
    /// Confidence of records returned by the vision collaborator
    pub ai_confidence: f64,
    pub recurring: DetectionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_document_text_length: 100,
            min_line_length: 10,
            max_ai_pages: 5,
            sample_rows: 20,
            text_confidence: 0.7,
            ai_confidence: 0.6,
            recurring: DetectionConfig::default(),
        }
    }
}

/// Recurring charge detection thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectionConfig {
    /// Groups with fewer occurrences are discarded
    pub min_occurrences: usize,
    /// Maximum `(max - min) / mean` spread of absolute amounts within a group
    pub amount_tolerance: Decimal,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_occurrences: 2,
            amount_tolerance: Decimal::new(10, 2),
        }
    }
}

impl EngineConfig {
    /// Load config from the settings directory
    ///
    /// A missing settings.json yields defaults. `NETWORTH_MAX_AI_PAGES` overrides
    /// the page cap (for deployments that meter AI usage).
    pub fn load(settings_dir: &Path) -> Result<Self> {
        let settings_path = settings_dir.join("settings.json");

        let mut config = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content)?.statements
        } else {
            EngineConfig::default()
        };

        if let Ok(raw) = std::env::var(MAX_AI_PAGES_ENV) {
            config.max_ai_pages = raw
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("{} must be a number, got '{}'", MAX_AI_PAGES_ENV, raw)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break parser invariants
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("textConfidence", self.text_confidence),
            ("aiConfidence", self.ai_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::config(format!("{} must be within [0, 1], got {}", name, value)));
            }
        }
        if self.ai_confidence >= self.text_confidence {
            return Err(Error::config(
                "aiConfidence must be lower than textConfidence",
            ));
        }
        if self.sample_rows == 0 {
            return Err(Error::config("sampleRows must be at least 1"));
        }
        if self.recurring.min_occurrences < 2 {
            return Err(Error::config("recurring.minOccurrences must be at least 2"));
        }
        if self.recurring.amount_tolerance.is_sign_negative() {
            return Err(Error::config("recurring.amountTolerance must not be negative"));
        }
        Ok(())
    }
}

//! Result and error types for the core library

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::format::FormatLabel;
use super::transaction::ParsedTransaction;

/// Core library error type
///
/// Parsers never let these escape the parse boundary: they are rendered into
/// [`ParseResult::errors`] (fatal) or [`ParseResult::warnings`] (non-fatal).
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported file type: {0}")]
    FormatUnsupported(String),

    #[error("{0}")]
    StructuralParseFailure(String),

    #[error("Row {row}: {reason}")]
    RowSkipped { row: String, reason: String },

    #[error("{0}")]
    ExternalAssistUnavailable(String),

    #[error("Page {page}: {reason}")]
    ExternalAssistFailure { page: usize, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Create a structural parse failure
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::StructuralParseFailure(msg.into())
    }

    /// Create a skipped-row warning
    pub fn row_skipped(row: impl ToString, reason: impl Into<String>) -> Self {
        Self::RowSkipped {
            row: row.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an AI-assist failure for a 1-based page
    pub fn assist_failure(page: usize, reason: impl Into<String>) -> Self {
        Self::ExternalAssistFailure {
            page,
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Debug metadata collected while parsing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseDebugInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers_detected: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_lines: Option<Vec<String>>,
}

/// Outcome of parsing one statement file
///
/// An empty `transactions` list with non-empty `errors` is the failure signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub transactions: Vec<ParsedTransaction>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Rows/blocks rejected as [`Error::RowSkipped`]; other warnings are not counted
    #[serde(default)]
    pub skipped_rows: usize,
    pub format: FormatLabel,
    /// Best-effort institution label ("chase", "generic", "auto-detected", OFX `<ORG>`...)
    pub institution: Option<String>,
    /// Masked account id, when the file carries one
    pub account_hint: Option<String>,
    /// Which parser produced this result ("csv", "ofx", "pdf_text", "ai", "hybrid")
    pub parser: String,
    pub debug: ParseDebugInfo,
}

impl ParseResult {
    /// Create an empty result for a parser
    pub fn new(format: FormatLabel, parser: impl Into<String>) -> Self {
        Self {
            transactions: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            skipped_rows: 0,
            format,
            institution: None,
            account_hint: None,
            parser: parser.into(),
            debug: ParseDebugInfo::default(),
        }
    }

    /// Create a failed result carrying a single fatal error
    pub fn failed(format: FormatLabel, parser: impl Into<String>, error: Error) -> Self {
        let mut result = Self::new(format, parser);
        result.push_error(error);
        result
    }

    pub fn push_error(&mut self, error: Error) {
        self.errors.push(error.to_string());
    }

    pub fn push_warning(&mut self, warning: Error) {
        if matches!(warning, Error::RowSkipped { .. }) {
            self.skipped_rows += 1;
        }
        self.warnings.push(warning.to_string());
    }

    /// True when at least one transaction was produced and nothing fatal happened
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && !self.transactions.is_empty()
    }

    /// User-facing one-liner, e.g. "372 of 400 rows imported; 28 skipped"
    pub fn summary(&self) -> String {
        if !self.is_success() {
            return match self.errors.first() {
                Some(e) => format!("Import failed: {}", e),
                None => "Import failed: no transactions found".to_string(),
            };
        }
        let imported = self.transactions.len();
        let skipped = self.skipped_rows;
        if skipped == 0 {
            format!("{} rows imported", imported)
        } else {
            format!(
                "{} of {} rows imported; {} skipped",
                imported,
                imported + skipped,
                skipped
            )
        }
    }
}

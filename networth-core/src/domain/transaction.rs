//! Parsed transaction domain model

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where a parsed transaction came from in the source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// A delimited-text row (1-based line number as reported by the CSV reader)
    Row { line: u64, cells: Vec<String> },
    /// A `<STMTTRN>` block (0-based block index, FITID when present)
    Block { index: usize, fit_id: Option<String> },
    /// A line matched by the document line scan (1-based page)
    Line { page: usize, text: String },
    /// A record returned by the vision collaborator (1-based page, 0-based record)
    Assisted { page: usize, record: usize },
}

/// A single normalized transaction extracted from a statement
///
/// `amount` is signed: positive is an inflow (credit), negative an outflow (debit),
/// whatever the convention of the source file was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_suggestion: Option<String>,
    /// In [0, 1]; structural parsers emit 1.0
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

impl ParsedTransaction {
    /// Create a transaction with full confidence and no optional fields
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date,
            description: description.into(),
            amount,
            merchant: None,
            category_suggestion: None,
            confidence: 1.0,
            provenance: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant = Some(merchant.into());
        self
    }

    pub fn is_inflow(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_outflow(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}

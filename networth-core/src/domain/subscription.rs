//! Recurring charge (subscription) candidates

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How often a recurring charge repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Classify an average gap between charges, in days
    ///
    /// Returns `None` for irregular gaps.
    pub fn from_average_interval(days: f64) -> Option<Self> {
        if (25.0..=35.0).contains(&days) {
            Some(Frequency::Monthly)
        } else if (350.0..=380.0).contains(&days) {
            Some(Frequency::Yearly)
        } else if (12.0..=16.0).contains(&days) {
            Some(Frequency::Biweekly)
        } else if (6.0..=8.0).contains(&days) {
            Some(Frequency::Weekly)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A group of transactions that looks like a subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionCandidate {
    /// Merchant or description of the most recent occurrence
    pub name: String,
    /// Mean absolute amount, rounded to cents
    pub average_amount: Decimal,
    pub frequency: Frequency,
    pub occurrences: usize,
    pub last_date: NaiveDate,
    pub sample_description: String,
}

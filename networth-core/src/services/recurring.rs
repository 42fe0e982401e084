//! Recurring charge (subscription) detection
//!
//! Works on already-normalized transactions and never touches the parse path.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::DetectionConfig;
use crate::domain::{Frequency, ParsedTransaction, SubscriptionCandidate};

static KEY_NOISE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[0-9#*\-_.,:;/\\'"()]+"#).unwrap());

/// Shorter keys are too generic to group on
const MIN_KEY_LEN: usize = 3;
const MAX_NAME_LEN: usize = 50;

/// Service for finding subscription-like groups in transaction history
pub struct RecurringDetector {
    config: DetectionConfig,
}

impl RecurringDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// Detect recurring charges, largest average amount first
    pub fn detect(&self, transactions: &[ParsedTransaction]) -> Vec<SubscriptionCandidate> {
        let mut groups: HashMap<String, Vec<&ParsedTransaction>> = HashMap::new();
        for tx in transactions {
            let key = grouping_key(tx);
            if key.chars().count() >= MIN_KEY_LEN {
                groups.entry(key).or_default().push(tx);
            }
        }

        let mut candidates: Vec<SubscriptionCandidate> = groups
            .into_values()
            .filter_map(|group| self.evaluate(group))
            .collect();

        candidates.sort_by(|a, b| {
            b.average_amount
                .cmp(&a.average_amount)
                .then_with(|| a.name.cmp(&b.name))
        });
        debug!(
            transactions = transactions.len(),
            candidates = candidates.len(),
            "Recurring detection finished"
        );
        candidates
    }

    fn evaluate(&self, mut group: Vec<&ParsedTransaction>) -> Option<SubscriptionCandidate> {
        if group.len() < self.config.min_occurrences.max(2) {
            return None;
        }

        let amounts: Vec<Decimal> = group.iter().map(|t| t.amount.abs()).collect();
        // Amounts near Decimal::MAX would overflow; such a group is dropped
        let total = amounts
            .iter()
            .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(*amount))?;
        let mean = total.checked_div(Decimal::from(amounts.len()))?;
        if mean.is_zero() {
            return None;
        }
        let max = amounts.iter().copied().max()?;
        let min = amounts.iter().copied().min()?;
        if (max - min).checked_div(mean)? > self.config.amount_tolerance {
            return None;
        }

        group.sort_by_key(|t| t.date);
        let intervals: Vec<i64> = group
            .windows(2)
            .map(|w| (w[1].date - w[0].date).num_days())
            .collect();
        let average_interval = intervals.iter().sum::<i64>() as f64 / intervals.len() as f64;
        let frequency = Frequency::from_average_interval(average_interval)?;

        let latest = group.last()?;
        let name = match latest.merchant.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(merchant) => merchant.to_string(),
            None => latest.description.chars().take(MAX_NAME_LEN).collect(),
        };

        Some(SubscriptionCandidate {
            name,
            average_amount: mean.round_dp(2),
            frequency,
            occurrences: group.len(),
            last_date: latest.date,
            sample_description: latest.description.clone(),
        })
    }
}

impl Default for RecurringDetector {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}

/// Case-folded merchant + description with digits and punctuation removed
pub fn grouping_key(tx: &ParsedTransaction) -> String {
    let raw = format!(
        "{} {}",
        tx.merchant.as_deref().unwrap_or_default(),
        tx.description
    )
    .to_lowercase();
    KEY_NOISE_RE
        .replace_all(&raw, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Outflows dated within `lookback_days` up to and including `end`
pub fn recent_outflows(
    transactions: &[ParsedTransaction],
    end: NaiveDate,
    lookback_days: i64,
) -> Vec<ParsedTransaction> {
    let start = end - Duration::days(lookback_days);
    transactions
        .iter()
        .filter(|t| t.is_outflow() && t.date >= start && t.date <= end)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn tx(y: i32, m: u32, d: u32, desc: &str, amount: &str) -> ParsedTransaction {
        ParsedTransaction::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            desc,
            Decimal::from_str(amount).unwrap(),
        )
    }

    #[test]
    fn test_monthly_subscription() {
        let txns: Vec<_> = (1..=4)
            .map(|m| tx(2024, m, 1, "NETFLIX.COM", "-15.99"))
            .collect();
        let found = RecurringDetector::default().detect(&txns);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].frequency, Frequency::Monthly);
        assert_eq!(found[0].occurrences, 4);
        assert_eq!(found[0].average_amount, Decimal::from_str("15.99").unwrap());
        assert_eq!(found[0].last_date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert_eq!(found[0].name, "NETFLIX.COM");
    }

    #[test]
    fn test_no_candidate_from_single_or_irregular() {
        let detector = RecurringDetector::default();
        assert!(detector.detect(&[tx(2024, 1, 1, "GYM", "-30.00")]).is_empty());

        let apart = [tx(2024, 1, 1, "GYM CLUB", "-30.00"), tx(2024, 4, 10, "GYM CLUB", "-30.00")];
        assert!(detector.detect(&apart).is_empty());
    }

    #[test]
    fn test_amount_spread_filter() {
        let detector = RecurringDetector::default();
        let varied = [
            tx(2024, 1, 5, "ELECTRIC CO", "-80.00"),
            tx(2024, 2, 5, "ELECTRIC CO", "-120.00"),
        ];
        assert!(detector.detect(&varied).is_empty());

        let close = [
            tx(2024, 1, 5, "SPOTIFY", "-10.99"),
            tx(2024, 2, 5, "SPOTIFY", "-11.49"),
        ];
        let found = detector.detect(&close);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].average_amount, Decimal::from_str("11.24").unwrap());
    }

    #[test]
    fn test_grouping_ignores_reference_numbers() {
        let txns = [
            tx(2024, 1, 3, "SPOTIFY P1A2B3 #1001", "-9.99"),
            tx(2024, 1, 10, "SPOTIFY P1A2B3 #1002", "-9.99"),
            tx(2024, 1, 17, "SPOTIFY P1A2B3 #1003", "-9.99"),
        ];
        assert_eq!(grouping_key(&txns[0]), grouping_key(&txns[1]));
        let found = RecurringDetector::default().detect(&txns);
        assert_eq!(found[0].frequency, Frequency::Weekly);
        assert_eq!(found[0].sample_description, "SPOTIFY P1A2B3 #1003");
    }

    #[test]
    fn test_overflowing_group_is_dropped() {
        let huge = [
            tx(2024, 1, 1, "WIRE TRANSFER", "-50000000000000000000000000000"),
            tx(2024, 2, 1, "WIRE TRANSFER", "-50000000000000000000000000000"),
        ];
        let mut txns = huge.to_vec();
        txns.push(tx(2024, 1, 1, "NETFLIX.COM", "-15.99"));
        txns.push(tx(2024, 2, 1, "NETFLIX.COM", "-15.99"));

        let found = RecurringDetector::default().detect(&txns);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "NETFLIX.COM");
    }

    #[test]
    fn test_short_keys_excluded_and_merchant_names() {
        let detector = RecurringDetector::default();
        let short = [tx(2024, 1, 1, "AB 12", "-5.00"), tx(2024, 2, 1, "AB 34", "-5.00")];
        assert!(detector.detect(&short).is_empty());

        let named = [
            tx(2024, 1, 1, "DD 0001 HULU", "-7.99").with_merchant("Hulu"),
            tx(2024, 2, 1, "DD 0002 HULU", "-7.99").with_merchant("Hulu"),
        ];
        assert_eq!(detector.detect(&named)[0].name, "Hulu");
    }

    #[test]
    fn test_sorted_by_amount_and_min_occurrences() {
        let mut txns = Vec::new();
        for m in 1..=3 {
            txns.push(tx(2024, m, 2, "CHEAP APP", "-1.99"));
            txns.push(tx(2024, m, 2, "PRICEY APP", "-49.99"));
        }
        let found = RecurringDetector::default().detect(&txns);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "PRICEY APP");

        let strict = RecurringDetector::new(DetectionConfig {
            min_occurrences: 4,
            ..DetectionConfig::default()
        });
        assert!(strict.detect(&txns).is_empty());
    }

    #[test]
    fn test_recent_outflows_window() {
        let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let txns = [
            tx(2024, 6, 1, "RENT", "-1000.00"),
            tx(2024, 6, 2, "SALARY", "2000.00"),
            tx(2023, 6, 1, "OLD", "-5.00"),
            tx(2024, 7, 1, "FUTURE", "-5.00"),
        ];
        let window = recent_outflows(&txns, end, 180);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].description, "RENT");
    }
}

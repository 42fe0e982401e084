//! Shared amount parsing
//!
//! Every sign convention found in statements is normalized to one signed value:
//! positive is an inflow, negative an outflow.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

/// Currency symbols stripped before the numeric parse
pub const CURRENCY_SYMBOLS: &[char] = &['$', '£', '€', '¥', '₹', '₿'];

/// Shape of a single amount cell: optional sign/parens/currency, digits with
/// optional thousands separators and decimals, optional CR/DR suffix
static AMOUNT_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[+\-]?\s*\(?\s*[+\-]?\s*[$£€¥₹₿]?\s*[+\-]?\s*(\d{1,3}(,\d{3})+|\d+)?(\.\d+)?\s*\)?\s*(cr|dr)?$")
        .unwrap()
});

/// Resolve an amount token into a signed value
///
/// - leading `-` is negative, leading `+` positive
/// - `(45.50)` is negative (accounting)
/// - trailing `CR` is positive, trailing `DR` negative
/// - currency symbols, thousands separators and inner spaces are ignored
/// - `$-50` is negative
///
/// Returns `None` when what remains is not a number.
pub fn resolve_amount(token: &str) -> Option<Decimal> {
    let mut cleaned = token.trim().to_string();
    if cleaned.is_empty() {
        return None;
    }

    let mut negative = false;

    if let Some(rest) = cleaned.strip_prefix('-') {
        negative = true;
        cleaned = rest.trim_start().to_string();
    } else if let Some(rest) = cleaned.strip_prefix('+') {
        cleaned = rest.to_string();
    }

    // A minus right after a currency symbol ("$-50", "$ -50")
    if CURRENCY_SYMBOLS
        .iter()
        .any(|sym| cleaned.contains(&format!("{}-", sym)) || cleaned.contains(&format!("{} -", sym)))
    {
        negative = true;
    }
    cleaned.retain(|c| !CURRENCY_SYMBOLS.contains(&c));

    let trimmed = cleaned.trim();
    if let Some(rest) = trimmed.strip_prefix('-') {
        negative = true;
        cleaned = rest.to_string();
    } else {
        cleaned = trimmed.to_string();
    }

    cleaned.retain(|c| c != ',' && !c.is_whitespace());

    if cleaned.starts_with('(') && cleaned.ends_with(')') && cleaned.len() >= 2 {
        negative = true;
        cleaned = cleaned[1..cleaned.len() - 1].to_string();
    }

    let upper = cleaned.to_ascii_uppercase();
    if upper.ends_with("CR") {
        negative = false;
        cleaned.truncate(cleaned.len() - 2);
    } else if upper.ends_with("DR") {
        negative = true;
        cleaned.truncate(cleaned.len() - 2);
    }

    let digits = cleaned.trim_start_matches('+').trim_end_matches('.');
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }

    let value = Decimal::from_str(digits).ok()?.abs();
    Some(if negative { -value } else { value })
}

/// True when a cell is shaped like a single amount and resolves to a number
///
/// Used by column inference, which must not count dates or free text.
pub fn looks_like_amount(cell: &str) -> bool {
    let cell = cell.trim().trim_matches(|c| c == '"' || c == '\'');
    if cell.is_empty() || !cell.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    AMOUNT_TOKEN_RE.is_match(cell) && resolve_amount(cell).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_explicit_signs() {
        assert_eq!(resolve_amount("-4.50"), Some(dec("-4.50")));
        assert_eq!(resolve_amount("+2500.00"), Some(dec("2500.00")));
        assert_eq!(resolve_amount("2500"), Some(dec("2500")));
        assert_eq!(resolve_amount("- 12.00"), Some(dec("-12.00")));
    }

    #[test]
    fn test_accounting_parentheses() {
        assert_eq!(resolve_amount("(45.50)"), Some(dec("-45.50")));
        assert_eq!(resolve_amount("$(1,045.50)"), Some(dec("-1045.50")));
    }

    #[test]
    fn test_credit_debit_suffixes() {
        assert_eq!(resolve_amount("100.00 CR"), Some(dec("100.00")));
        assert_eq!(resolve_amount("100.00cr"), Some(dec("100.00")));
        assert_eq!(resolve_amount("-100.00 CR"), Some(dec("100.00")));
        assert_eq!(resolve_amount("75.25 DR"), Some(dec("-75.25")));
    }

    #[test]
    fn test_currency_symbols() {
        assert_eq!(resolve_amount("$-12.34"), Some(dec("-12.34")));
        assert_eq!(resolve_amount("$ -12.34"), Some(dec("-12.34")));
        assert_eq!(resolve_amount("-$12.34"), Some(dec("-12.34")));
        assert_eq!(resolve_amount("€-9.99"), Some(dec("-9.99")));
        assert_eq!(resolve_amount("£1,234.00"), Some(dec("1234.00")));
        assert_eq!(resolve_amount("$1,234,567.89"), Some(dec("1234567.89")));
    }

    #[test]
    fn test_unparsable() {
        assert_eq!(resolve_amount(""), None);
        assert_eq!(resolve_amount("   "), None);
        assert_eq!(resolve_amount("abc"), None);
        assert_eq!(resolve_amount("12.34.56"), None);
        assert_eq!(resolve_amount("$"), None);
        assert_eq!(resolve_amount("CR"), None);
    }

    #[test]
    fn test_looks_like_amount() {
        assert!(looks_like_amount("-45.99"));
        assert!(looks_like_amount("1,234.56"));
        assert!(looks_like_amount("(12.00)"));
        assert!(looks_like_amount("\"$5.00\""));
        assert!(looks_like_amount("100.00 CR"));
        assert!(looks_like_amount("1001"));
        assert!(!looks_like_amount("2024-01-15"));
        assert!(!looks_like_amount("Coffee Shop"));
        assert!(!looks_like_amount("12 Main St"));
        assert!(!looks_like_amount(""));
    }
}

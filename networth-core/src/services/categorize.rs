//! Rule-based category suggestions
//!
//! Keyword matching over description and merchant. Suggestions are advisory:
//! the review step decides what gets committed.

use rust_decimal::Decimal;

use crate::domain::ParseResult;

pub const OTHER: &str = "Other";

/// Category name -> keywords, matched case-insensitively as substrings
pub static CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Salary",
        &["payroll", "salary", "wages", "direct deposit", "paycheck", "employer", "income", "bonus", "commission"],
    ),
    (
        "Housing",
        &["rent", "mortgage", "hoa", "property tax", "home insurance", "landlord", "apartment", "lease"],
    ),
    (
        "Food & Dining",
        &[
            "restaurant", "cafe", "coffee", "starbucks", "mcdonalds", "burger", "pizza", "chipotle", "subway",
            "wendys", "taco bell", "dunkin", "uber eats", "doordash", "grubhub", "seamless", "postmates", "grocery",
            "walmart", "target", "costco", "whole foods", "trader joe", "kroger", "safeway", "publix", "aldi",
            "dining", "food",
        ],
    ),
    (
        "Transportation",
        &[
            "uber", "lyft", "taxi", "gas", "shell", "chevron", "exxon", "bp", "parking", "toll", "metro", "transit",
            "bus", "train", "amtrak", "car wash", "auto repair", "mechanic", "oil change",
        ],
    ),
    (
        "Utilities",
        &[
            "electric", "water", "gas bill", "internet", "comcast", "verizon", "at&t", "t-mobile", "sprint",
            "phone bill", "cable", "utility",
        ],
    ),
    (
        "Shopping",
        &[
            "amazon", "ebay", "walmart", "target", "costco", "best buy", "apple store", "ikea", "home depot",
            "lowes", "nordstrom", "macys", "tj maxx", "marshalls", "ross", "kohls", "jcpenney", "shopping",
        ],
    ),
    (
        "Entertainment",
        &[
            "movie", "cinema", "theatre", "concert", "ticketmaster", "stubhub", "gaming", "playstation", "xbox",
            "nintendo", "steam", "twitch", "spotify", "apple music", "pandora", "hulu", "disney+", "hbo",
            "paramount", "peacock", "youtube premium",
        ],
    ),
    (
        "Healthcare",
        &[
            "pharmacy", "cvs", "walgreens", "rite aid", "doctor", "hospital", "clinic", "dental", "optometrist",
            "prescription", "medical", "health insurance", "copay", "lab", "urgent care",
        ],
    ),
    (
        "Subscriptions",
        &[
            "netflix", "spotify", "hulu", "disney", "amazon prime", "youtube", "apple", "google one", "dropbox",
            "adobe", "microsoft 365", "gym", "fitness", "membership", "subscription", "monthly",
        ],
    ),
];

const REFUND_WORDS: &[&str] = &["refund", "return", "cashback", "rebate"];

/// A suggested category with its confidence in [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySuggestion {
    pub category: String,
    pub confidence: f64,
}

/// Suggest a category for one transaction
///
/// Longer keywords score higher (0.95 / 0.85 / 0.70) and a whole-word match
/// adds 0.05. The first category to reach the best score wins. A positive
/// amount mentioning a refund is reported as [`OTHER`] unless it is salary.
pub fn suggest_category(description: &str, merchant: Option<&str>, amount: Decimal) -> Option<CategorySuggestion> {
    let text = format!("{} {}", description, merchant.unwrap_or_default()).to_lowercase();

    let mut best: Option<(&str, f64)> = None;
    for &(category, keywords) in CATEGORY_KEYWORDS {
        for keyword in keywords.iter().filter(|k| text.contains(*k)) {
            let mut score = match keyword.chars().count() {
                n if n >= 8 => 0.95,
                n if n >= 5 => 0.85,
                _ => 0.70,
            };
            if contains_word(&text, keyword) {
                score = f64::min(score + 0.05, 1.0);
            }
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((category, score));
            }
        }
    }

    let is_salary = matches!(best, Some(("Salary", _)));
    if amount > Decimal::ZERO && !is_salary && REFUND_WORDS.iter().any(|w| text.contains(w)) {
        best = Some((OTHER, 0.75));
    }

    best.map(|(category, confidence)| CategorySuggestion {
        category: category.to_string(),
        confidence,
    })
}

/// Fill `category_suggestion` on every transaction that has none yet
///
/// Returns how many transactions received a suggestion.
pub fn apply_category_suggestions(result: &mut ParseResult) -> usize {
    let mut applied = 0;
    for tx in result.transactions.iter_mut().filter(|t| t.category_suggestion.is_none()) {
        if let Some(suggestion) = suggest_category(&tx.description, tx.merchant.as_deref(), tx.amount) {
            tx.category_suggestion = Some(suggestion.category);
            applied += 1;
        }
    }
    applied
}

/// Keyword bounded by non-alphanumerics (or the ends of `text`)
fn contains_word(text: &str, keyword: &str) -> bool {
    text.match_indices(keyword).any(|(start, matched)| {
        let before = text[..start].chars().next_back();
        let after = text[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

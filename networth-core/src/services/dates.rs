//! Shared date parsing with a per-document day/month order hint
//!
//! The hint is a value carried by [`ParseContext`]; nothing is cached between
//! documents, so concurrent parses cannot disturb each other.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `DD/MM/YYYY`, `MM-DD-YY`, `DD.MM.YYYY`...
static NUMERIC_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})([/.\-])(\d{1,2})([/.\-])(\d{2}|\d{4})$").unwrap());

/// `YYYY-MM-DD`, `YYYY/MM/DD`
static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[/\-](\d{1,2})[/\-](\d{1,2})$").unwrap());

/// Named-month forms, tried after ISO
const NAMED_MONTH_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%d %b %Y", "%d %B %Y", "%b %d %Y"];

/// Which component of an ambiguous numeric date is the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `DD/MM/YYYY`
    #[default]
    DayFirst,
    /// `MM/DD/YYYY`
    MonthFirst,
}

impl DateOrder {
    /// Infer the order from raw date tokens of one document
    ///
    /// Looks at up to `limit` tokens; the first token whose leading component
    /// exceeds 12 forces day-first, whose second component exceeds 12 forces
    /// month-first. Year-first tokens are skipped. Defaults to day-first.
    pub fn detect<'a, I>(samples: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        for sample in samples.into_iter().take(limit) {
            let parts: Vec<&str> = sample.trim().split(['/', '-', '.']).collect();
            if parts.len() < 2 || parts[0].len() == 4 {
                continue;
            }
            let (Ok(first), Ok(second)) = (parts[0].trim().parse::<u32>(), parts[1].trim().parse::<u32>()) else {
                continue;
            };
            if first > 12 {
                return DateOrder::DayFirst;
            }
            if second > 12 {
                return DateOrder::MonthFirst;
            }
        }
        DateOrder::default()
    }

    /// strftime pattern used to render dates in this order
    pub fn pattern(&self) -> &'static str {
        match self {
            DateOrder::DayFirst => "%d/%m/%Y",
            DateOrder::MonthFirst => "%m/%d/%Y",
        }
    }
}

/// Per-invocation parse state threaded through every date call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseContext {
    pub date_order: DateOrder,
}

impl ParseContext {
    pub fn new(date_order: DateOrder) -> Self {
        Self { date_order }
    }

    /// Build a context from a document's raw date tokens
    pub fn from_samples<'a, I>(samples: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let date_order = DateOrder::detect(samples, limit);
        debug!(?date_order, "Detected date order");
        Self { date_order }
    }

    /// Resolve a date token
    ///
    /// Order: the hinted numeric family, then unambiguous absolute forms
    /// (ISO, named months), then the other numeric family. First match wins.
    pub fn resolve_date(&self, token: &str) -> Option<NaiveDate> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        let (primary, secondary) = match self.date_order {
            DateOrder::DayFirst => (DateOrder::DayFirst, DateOrder::MonthFirst),
            DateOrder::MonthFirst => (DateOrder::MonthFirst, DateOrder::DayFirst),
        };

        parse_numeric(token, primary)
            .or_else(|| parse_absolute(token))
            .or_else(|| parse_numeric(token, secondary))
    }
}

fn parse_numeric(token: &str, order: DateOrder) -> Option<NaiveDate> {
    let caps = NUMERIC_DATE_RE.captures(token)?;
    // Mixed separators ("01/02-2024") are not a date
    if caps[2] != caps[4] {
        return None;
    }
    let a: u32 = caps[1].parse().ok()?;
    let b: u32 = caps[3].parse().ok()?;
    let year = expand_year(&caps[5])?;
    let (day, month) = match order {
        DateOrder::DayFirst => (a, b),
        DateOrder::MonthFirst => (b, a),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_absolute(token: &str) -> Option<NaiveDate> {
    if let Some(caps) = ISO_DATE_RE.captures(token) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    NAMED_MONTH_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
}

/// Two-digit years pivot like strptime: 69-99 are 19xx, 00-68 are 20xx
fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    Some(match raw.len() {
        2 if year >= 69 => 1900 + year,
        2 => 2000 + year,
        _ => year,
    })
}

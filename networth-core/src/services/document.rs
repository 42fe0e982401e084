//! Paged document and image parser
//!
//! Embedded text is scanned line by line first. Pages without text, or the
//! whole document when the scan finds nothing, are rasterized and handed to the
//! vision collaborator. The collaborator's reply is untrusted: every record is
//! validated before it becomes a transaction.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::domain::result::{Error, Result};
use crate::domain::{FormatLabel, ParseResult, ParsedTransaction, Provenance};
use crate::ports::{PageSource, VisionAssist};
use crate::services::amounts::resolve_amount;
use crate::services::dates::ParseContext;

pub const PARSER_TEXT: &str = "pdf_text";
pub const PARSER_AI: &str = "ai";
pub const PARSER_HYBRID: &str = "hybrid";

/// Characters of description used in the duplicate-line key
const DEDUP_PREFIX: usize = 30;

static DATE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4}|\d{4}[/\-]\d{1,2}[/\-]\d{1,2})\b").unwrap()
});

/// Amounts on a statement line always carry cents
static LINE_AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\(?[-+]?[$£€¥₹]?-?[\d,]*\d\.\d{2}\)?(CR|DR)?$").unwrap());

static SKIP_WORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(date|description|amount|balance|total|beginning|ending|statement|period)\b").unwrap()
});

static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").unwrap());

pub const EXTRACTION_PROMPT: &str = r#"Analyze this bank statement image and extract all transactions.

For each transaction, provide:
- date: The transaction date (format: YYYY-MM-DD)
- description: The merchant or transaction description
- amount: The amount (positive for deposits/credits, negative for withdrawals/debits)

Return the data as a JSON array like this:
[
  {"date": "2024-01-15", "description": "AMAZON PURCHASE", "amount": -45.99},
  {"date": "2024-01-14", "description": "PAYROLL DEPOSIT", "amount": 2500.00}
]

Only return the JSON array, no other text. If you cannot read the statement clearly, return an empty array []."#;

/// Parse a paged document (PDF or raster image)
pub fn parse_document(
    source: &dyn PageSource,
    format: FormatLabel,
    config: &EngineConfig,
    assist: Option<&dyn VisionAssist>,
) -> ParseResult {
    let mut result = ParseResult::new(format, PARSER_TEXT);
    if let Err(err) = parse_into(source, config, assist, &mut result) {
        result.push_error(err);
    }
    info!(
        format = %format,
        parser = %result.parser,
        transactions = result.transactions.len(),
        warnings = result.warnings.len(),
        failed = !result.errors.is_empty(),
        "Parsed document statement"
    );
    result
}

fn parse_into(
    source: &dyn PageSource,
    config: &EngineConfig,
    assist: Option<&dyn VisionAssist>,
    result: &mut ParseResult,
) -> Result<()> {
    let page_count = source.page_count();
    let pages: Vec<String> = (0..page_count)
        .map(|page| match source.extract_text(page) {
            Ok(text) => text,
            Err(err) => {
                warn!(page = page + 1, error = %err, "Text extraction failed");
                result.warnings.push(format!("Page {}: text extraction failed: {}", page + 1, err));
                String::new()
            }
        })
        .collect();

    result.debug.sample_lines = Some(
        pages
            .iter()
            .flat_map(|p| p.lines())
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(10)
            .map(|l| l.chars().take(100).collect())
            .collect(),
    );

    let text_len: usize = pages.iter().map(|p| p.trim().chars().count()).sum();
    let has_text = text_len > config.min_document_text_length;
    let ctx = document_context(&pages, config.sample_rows);

    let mut by_page: Vec<Vec<ParsedTransaction>> = vec![Vec::new(); page_count];
    let mut text_found = 0;
    if has_text {
        let mut seen = HashSet::new();
        for (page, text) in pages.iter().enumerate() {
            by_page[page] = scan_lines(text, page, &ctx, config, &mut seen);
            text_found += by_page[page].len();
        }
        debug!(pages = page_count, found = text_found, "Line scan finished");
    }

    let ai_pages: Vec<usize> = (0..page_count)
        .filter(|&page| text_found == 0 || pages[page].trim().is_empty())
        .take(config.max_ai_pages)
        .collect();

    let mut ai_found = 0;
    let mut failures = Vec::new();
    if !ai_pages.is_empty() {
        match assist.filter(|a| a.is_available()) {
            Some(assist) => {
                if has_text && text_found == 0 {
                    result.warnings.push("Text extraction found no transactions, trying AI...".to_string());
                }
                for &page in &ai_pages {
                    match assist_page(source, page, assist, &ctx, config, result) {
                        Ok(txns) => {
                            ai_found += txns.len();
                            by_page[page].extend(txns);
                        }
                        Err(err) => {
                            warn!(page = page + 1, error = %err, "AI extraction failed");
                            failures.push(err);
                        }
                    }
                }
                if page_count > ai_pages.len() && text_found == 0 {
                    result.warnings.push(format!(
                        "Only the first {} of {} pages were sent for AI extraction",
                        ai_pages.len(),
                        page_count
                    ));
                }
            }
            None if text_found == 0 => {
                return Err(Error::ExternalAssistUnavailable(unavailable_message(
                    result.format,
                    has_text,
                )));
            }
            None => {
                for &page in &ai_pages {
                    result.warnings.push(format!(
                        "Page {}: no embedded text and no AI provider configured",
                        page + 1
                    ));
                }
            }
        }
    }

    result.parser = match (text_found > 0, ai_found > 0 || (text_found == 0 && !ai_pages.is_empty())) {
        (true, true) => PARSER_HYBRID,
        (false, true) => PARSER_AI,
        _ => PARSER_TEXT,
    }
    .to_string();

    // Nothing else produced transactions, so the AI failures are the cause
    if text_found == 0 && ai_found == 0 {
        if let Some(last) = failures.pop() {
            for err in failures {
                result.push_error(err);
            }
            return Err(last);
        }
    }
    for err in failures {
        result.push_warning(err);
    }

    result.transactions = by_page.into_iter().flatten().collect();
    if result.transactions.is_empty() {
        return Err(Error::structural("No transactions found in the document"));
    }
    Ok(())
}

fn unavailable_message(format: FormatLabel, has_text: bool) -> String {
    if format.is_image() {
        "Image parsing requires an AI provider. Configure one in Settings to import screenshots and photos."
            .to_string()
    } else if has_text {
        "Could not parse transactions from PDF text. Configure an AI provider in Settings to parse scanned documents."
            .to_string()
    } else {
        "This PDF appears to be scanned/image-based. Configure an AI provider in Settings to parse scanned PDFs."
            .to_string()
    }
}

/// Date-order hint from every date token in the document
fn document_context(pages: &[String], limit: usize) -> ParseContext {
    let samples: Vec<&str> = pages
        .iter()
        .flat_map(|p| DATE_TOKEN_RE.find_iter(p))
        .map(|m| m.as_str())
        .collect();
    ParseContext::from_samples(samples, limit)
}

type LineKey = (NaiveDate, String, Decimal);

/// Find transaction lines on one page; `seen` spans the whole document
fn scan_lines(
    text: &str,
    page: usize,
    ctx: &ParseContext,
    config: &EngineConfig,
    seen: &mut HashSet<LineKey>,
) -> Vec<ParsedTransaction> {
    let mut found = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.chars().count() < config.min_line_length || line.to_lowercase().contains("balance") {
            continue;
        }
        let Some((date, description, amount)) = scan_line(line, ctx) else {
            continue;
        };
        if description.chars().count() < 3 || SKIP_WORDS_RE.is_match(&description) {
            continue;
        }

        let key = (
            date,
            description.chars().take(DEDUP_PREFIX).collect::<String>(),
            amount.round_dp(2),
        );
        if !seen.insert(key) {
            continue;
        }

        found.push(
            ParsedTransaction::new(date, description, amount)
                .with_confidence(config.text_confidence)
                .with_provenance(Provenance::Line {
                    page: page + 1,
                    text: line.to_string(),
                }),
        );
    }
    found
}

/// Date, description and amount of a single line, if it has all three
fn scan_line(line: &str, ctx: &ParseContext) -> Option<(NaiveDate, String, Decimal)> {
    let date_match = DATE_TOKEN_RE.find(line)?;
    let date = ctx.resolve_date(date_match.as_str())?;

    let mut rest = line.to_string();
    rest.replace_range(date_match.range(), " ");
    let tokens = merge_tokens(rest.split_whitespace());

    let mut amount = None;
    let mut words = Vec::new();
    for token in &tokens {
        if LINE_AMOUNT_RE.is_match(token) {
            if amount.is_none() {
                amount = resolve_amount(token).filter(|v| !v.is_zero());
            }
        } else {
            words.push(token.as_str());
        }
    }

    let description = words
        .join(" ")
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '*' | '|'))
        .to_string();
    Some((date, description, amount?))
}

/// Re-attach detached signs, currency symbols and CR/DR suffixes
fn merge_tokens<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending_prefix = String::new();
    for token in raw {
        let upper = token.to_ascii_uppercase();
        if (upper == "CR" || upper == "DR") && tokens.last().is_some_and(|t| LINE_AMOUNT_RE.is_match(t)) {
            if let Some(last) = tokens.last_mut() {
                last.push_str(token);
            }
            continue;
        }
        if matches!(token, "-" | "+" | "$" | "-$") {
            pending_prefix.push_str(token);
            continue;
        }
        tokens.push(format!("{}{}", std::mem::take(&mut pending_prefix), token));
    }
    if !pending_prefix.is_empty() {
        tokens.push(pending_prefix);
    }
    tokens
}

/// Rasterize one page and turn the collaborator's reply into transactions
fn assist_page(
    source: &dyn PageSource,
    page: usize,
    assist: &dyn VisionAssist,
    ctx: &ParseContext,
    config: &EngineConfig,
    result: &mut ParseResult,
) -> Result<Vec<ParsedTransaction>> {
    let number = page + 1;
    let raster = source
        .rasterize(page)
        .map_err(|e| Error::assist_failure(number, format!("could not render page: {}", e)))?;

    let reply = assist
        .vision_complete(&raster.bytes, &raster.mime_type, EXTRACTION_PROMPT)
        .map_err(|e| Error::assist_failure(number, format!("AI request failed: {:#}", e)))?;

    let records = reply_records(&reply).map_err(|reason| Error::assist_failure(number, reason))?;

    let mut txns = Vec::new();
    for (record, value) in records.iter().enumerate() {
        match validate_record(value, ctx) {
            Ok((date, description, amount)) => txns.push(
                ParsedTransaction::new(date, description, amount)
                    .with_confidence(config.ai_confidence)
                    .with_provenance(Provenance::Assisted { page: number, record }),
            ),
            Err(reason) => result.push_warning(Error::assist_failure(
                number,
                format!("record {} dropped: {}", record + 1, reason),
            )),
        }
    }
    debug!(page = number, records = records.len(), kept = txns.len(), "AI page processed");
    Ok(txns)
}

/// JSON records from a reply: a bare array, or an object with a `transactions` array
fn reply_records(reply: &str) -> std::result::Result<Vec<Value>, String> {
    let trimmed = reply.trim();
    let body = CODE_FENCE_RE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map_or(trimmed, |m| m.as_str());

    let value: Value = serde_json::from_str(body).map_err(|e| format!("response was not valid JSON: {}", e))?;
    match value {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => match map.remove("transactions") {
            Some(Value::Array(records)) => Ok(records),
            _ => Err("response did not contain a transaction list".to_string()),
        },
        _ => Err("response was not a JSON array".to_string()),
    }
}

fn validate_record(value: &Value, ctx: &ParseContext) -> std::result::Result<(NaiveDate, String, Decimal), String> {
    let record = value.as_object().ok_or("not an object")?;

    let raw_date = record.get("date").and_then(Value::as_str).ok_or("missing date")?;
    let date = ctx
        .resolve_date(raw_date)
        .ok_or_else(|| format!("unrecognized date '{}'", raw_date))?;

    let amount = match record.get("amount") {
        Some(Value::Number(n)) => {
            resolve_amount(&n.to_string()).or_else(|| n.as_f64().and_then(Decimal::from_f64))
        }
        Some(Value::String(s)) => resolve_amount(s),
        _ => None,
    }
    .ok_or("missing or non-numeric amount")?;
    if amount.is_zero() {
        return Err("amount is zero".to_string());
    }

    let description = record
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or("missing description")?;

    Ok((date, description.to_string(), amount))
}

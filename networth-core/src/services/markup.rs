//! OFX/QFX statement parser
//!
//! OFX 1.x is SGML: closing tags are optional, so a transaction block ends at
//! its own closing tag, the next opening tag, the end of the list, or EOF.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::info;

use crate::domain::result::{Error, Result};
use crate::domain::{FormatLabel, ParseResult, ParsedTransaction, Provenance};
use crate::services::amounts::resolve_amount;

pub const PARSER_NAME: &str = "ofx";

const BLOCK_OPEN: &str = "<STMTTRN>";
const BLOCK_TERMINATORS: &[&str] = &["</STMTTRN>", "<STMTTRN>", "</BANKTRANLIST>"];

static ORG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<ORG>([^<\r\n]+)").unwrap());
static ACCTID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<ACCTID>([^<\r\n]+)").unwrap());
static DTPOSTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<DTPOSTED>([^<\r\n]+)").unwrap());
static TRNAMT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<TRNAMT>([^<\r\n]+)").unwrap());
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<NAME>([^<\r\n]+)").unwrap());
static MEMO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<MEMO>([^<\r\n]+)").unwrap());
static FITID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<FITID>([^<\r\n]+)").unwrap());

/// Parse OFX/QFX text; `format` is echoed into the result
pub fn parse_markup(text: &str, format: FormatLabel) -> ParseResult {
    let mut result = ParseResult::new(format, PARSER_NAME);
    if let Err(err) = parse_into(text, &mut result) {
        result.push_error(err);
    }
    info!(
        format = %format,
        transactions = result.transactions.len(),
        skipped = result.skipped_rows,
        "Parsed markup statement"
    );
    result
}

fn parse_into(text: &str, result: &mut ParseResult) -> Result<()> {
    let blocks = transaction_blocks(text);
    if blocks.is_empty() {
        return Err(Error::structural("No transactions found in OFX file"));
    }

    result.institution = field(&ORG_RE, text);
    result.account_hint = field(&ACCTID_RE, text).map(|id| mask_account(&id));

    for (index, block) in blocks.iter().enumerate() {
        match parse_block(index, block) {
            Ok(tx) => result.transactions.push(tx),
            Err(warning) => result.push_warning(warning),
        }
    }

    if result.transactions.is_empty() {
        return Err(Error::structural("No valid transactions parsed from OFX"));
    }
    Ok(())
}

/// Slice out the body of every `<STMTTRN>` block
fn transaction_blocks(text: &str) -> Vec<&str> {
    // ASCII uppercasing keeps byte offsets aligned with `text`
    let upper = text.to_ascii_uppercase();
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some(found) = upper[cursor..].find(BLOCK_OPEN) {
        let start = cursor + found + BLOCK_OPEN.len();
        let end = BLOCK_TERMINATORS
            .iter()
            .filter_map(|t| upper[start..].find(t).map(|pos| start + pos))
            .min()
            .unwrap_or(text.len());
        blocks.push(&text[start..end]);
        cursor = end;
    }
    blocks
}

fn parse_block(index: usize, block: &str) -> Result<ParsedTransaction> {
    let row = index + 1;

    let posted = field(&DTPOSTED_RE, block).ok_or_else(|| Error::row_skipped(row, "missing DTPOSTED"))?;
    let date = parse_posted(&posted)
        .ok_or_else(|| Error::row_skipped(row, format!("unrecognized DTPOSTED '{}'", posted)))?;

    let raw_amount = field(&TRNAMT_RE, block).ok_or_else(|| Error::row_skipped(row, "missing TRNAMT"))?;
    let amount = resolve_amount(&raw_amount)
        .ok_or_else(|| Error::row_skipped(row, format!("unreadable TRNAMT '{}'", raw_amount)))?;

    let description = field(&NAME_RE, block)
        .or_else(|| field(&MEMO_RE, block))
        .map(|d| decode_entities(&d))
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(ParsedTransaction::new(date, description, amount).with_provenance(Provenance::Block {
        index,
        fit_id: field(&FITID_RE, block),
    }))
}

/// `YYYYMMDD`, optionally followed by time and timezone
fn parse_posted(raw: &str) -> Option<NaiveDate> {
    let head = raw.get(..8)?;
    NaiveDate::parse_from_str(head, "%Y%m%d").ok()
}

/// First capture of a `<TAG>value` pattern, trimmed, up to the next tag or line break
fn field(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|v| !v.is_empty())
}

fn mask_account(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("***{}", tail)
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

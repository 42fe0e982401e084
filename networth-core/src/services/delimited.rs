//! Delimited-text (CSV/TSV) statement parser
//!
//! Columns are located by header name when a known layout matches, and by
//! sampling the data otherwise.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::domain::result::{Error, Result};
use crate::domain::{FormatLabel, ParseResult, ParsedTransaction, Provenance};
use crate::services::amounts::{looks_like_amount, resolve_amount};
use crate::services::banks::{find_column, profile_for_headers, BankProfile};
use crate::services::dates::ParseContext;

pub const PARSER_NAME: &str = "csv";

/// Characters sampled for delimiter detection
const DELIMITER_SAMPLE: usize = 2000;

static BARE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+\.?\d*$").unwrap());

/// One physical record of the file
#[derive(Debug, Clone)]
struct Row {
    line: u64,
    cells: Vec<String>,
}

impl Row {
    fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }

    fn cell(&self, idx: usize) -> Option<&str> {
        self.cells.get(idx).map(String::as_str).filter(|c| !c.is_empty())
    }
}

/// Column index per role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: Option<usize>,
    pub description: Option<usize>,
    pub amount: Option<usize>,
    pub debit: Option<usize>,
    pub credit: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &[String], profile: &BankProfile) -> Self {
        Self {
            date: find_column(headers, profile.date),
            description: find_column(headers, profile.description),
            amount: find_column(headers, profile.amount),
            debit: find_column(headers, profile.debit),
            credit: find_column(headers, profile.credit),
        }
    }

    fn has_amount_source(&self) -> bool {
        self.amount.is_some() || self.debit.is_some() || self.credit.is_some()
    }

    fn is_resolved(&self) -> bool {
        self.date.is_some() && self.description.is_some() && self.has_amount_source()
    }

    /// Fill roles that are still missing from another map
    fn fill_from(&mut self, other: ColumnMap) {
        self.date = self.date.or(other.date);
        self.description = self.description.or(other.description);
        self.amount = self.amount.or(other.amount);
        self.debit = self.debit.or(other.debit);
        self.credit = self.credit.or(other.credit);
    }

    fn is_used(&self, idx: usize) -> bool {
        [self.date, self.description, self.amount, self.debit, self.credit].contains(&Some(idx))
    }
}

/// Per-column tallies gathered during inference
#[derive(Debug, Clone, Copy, Default)]
struct ColumnStats {
    date_count: usize,
    amount_count: usize,
    text_count: usize,
    has_negative: bool,
    has_positive: bool,
}

/// Parse delimited statement text
pub fn parse_delimited(text: &str, config: &EngineConfig) -> ParseResult {
    let mut result = ParseResult::new(FormatLabel::Csv, PARSER_NAME);
    if let Err(err) = parse_into(text, config, &mut result) {
        result.push_error(err);
    }
    info!(
        transactions = result.transactions.len(),
        skipped = result.skipped_rows,
        failed = !result.errors.is_empty(),
        "Parsed delimited statement"
    );
    result
}

fn parse_into(text: &str, config: &EngineConfig, result: &mut ParseResult) -> Result<()> {
    let delimiter = detect_delimiter(text);
    let rows = read_rows(text, delimiter)?;
    if rows.len() < 2 {
        return Err(Error::structural("CSV file appears to be empty or has no data rows"));
    }

    let header_idx = rows.iter().position(|r| !r.is_blank()).unwrap_or(0);
    let first_row = &rows[header_idx].cells;

    let (headers, data_rows): (Vec<String>, &[Row]) = if looks_like_data(first_row) {
        result.warnings.push("No header row detected - using auto-detection".to_string());
        (Vec::new(), &rows[header_idx..])
    } else {
        (first_row.clone(), &rows[header_idx + 1..])
    };

    result.debug.headers_detected = Some(if headers.is_empty() {
        vec!["(no headers - auto-detected)".to_string()]
    } else {
        headers.clone()
    });
    result.debug.sample_lines = Some(
        data_rows
            .iter()
            .filter(|r| !r.is_blank())
            .take(3)
            .map(|r| r.cells.join(", "))
            .collect(),
    );

    let mut columns = ColumnMap::default();
    if !headers.is_empty() {
        let profile = profile_for_headers(&headers);
        result.institution = Some(profile.id.to_string());
        columns = ColumnMap::from_headers(&headers, profile);
    }

    if !columns.is_resolved() {
        let inferred = infer_columns(data_rows, config.sample_rows);
        result.institution = Some("auto-detected".to_string());
        columns.fill_from(inferred);
    }
    debug!(?columns, delimiter, "Resolved columns");

    let date_col = columns
        .date
        .ok_or_else(|| Error::structural(format!("Could not find date column. Headers: {:?}", headers)))?;

    let ctx = ParseContext::from_samples(
        data_rows.iter().filter_map(|r| r.cell(date_col)),
        config.sample_rows,
    );

    if columns.description.is_none() {
        columns.description = (0..headers.len()).find(|&i| !columns.is_used(i));
    }
    if columns.description.is_none() {
        return Err(Error::structural(format!(
            "Could not find description column. Headers: {:?}",
            headers
        )));
    }
    if !columns.has_amount_source() {
        return Err(Error::structural(format!(
            "Could not find amount column. Headers: {:?}",
            headers
        )));
    }

    for row in data_rows.iter().filter(|r| !r.is_blank()) {
        match parse_row(row, &columns, &ctx) {
            Ok(tx) => result.transactions.push(tx),
            Err(warning) => result.push_warning(warning),
        }
    }

    if result.transactions.is_empty() {
        return Err(Error::structural(format!(
            "No valid transactions found. Detected columns - Date: {}, Desc: {}, Amount: {}",
            describe(columns.date),
            describe(columns.description),
            describe(columns.amount.or(columns.debit).or(columns.credit)),
        )));
    }
    Ok(())
}

/// Tab wins over comma only when it is more frequent in the sample
pub fn detect_delimiter(text: &str) -> u8 {
    let (tabs, commas) = text
        .chars()
        .take(DELIMITER_SAMPLE)
        .fold((0usize, 0usize), |(t, c), ch| match ch {
            '\t' => (t + 1, c),
            ',' => (t, c + 1),
            _ => (t, c),
        });
    if tabs > commas {
        b'\t'
    } else {
        b','
    }
}

fn read_rows(text: &str, delimiter: u8) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(Row {
            line: record.position().map(|p| p.line()).unwrap_or(0),
            cells: record.iter().map(str::to_string).collect(),
        });
    }
    Ok(rows)
}

/// A first row holding a date or a bare number is data, not a header
fn looks_like_data(cells: &[String]) -> bool {
    let probe = ParseContext::default();
    cells.iter().any(|cell| {
        if probe.resolve_date(cell).is_some() {
            return true;
        }
        let cleaned: String = cell
            .chars()
            .filter(|c| !matches!(c, '"' | '\'' | ',' | '$') && !c.is_whitespace())
            .collect();
        BARE_NUMBER_RE.is_match(&cleaned)
    })
}

/// Guess column roles from raw cells
#[cfg(test)]
pub(crate) fn infer_columns_from_cells(rows: &[Vec<String>], sample: usize) -> ColumnMap {
    let rows: Vec<Row> = rows
        .iter()
        .map(|cells| Row {
            line: 0,
            cells: cells.iter().map(|c| c.trim().to_string()).collect(),
        })
        .collect();
    infer_columns(&rows, sample)
}

fn infer_columns(rows: &[Row], sample: usize) -> ColumnMap {
    let sampled: Vec<&Row> = rows.iter().filter(|r| !r.is_blank()).take(sample).collect();
    let width = sampled.iter().map(|r| r.cells.len()).max().unwrap_or(0);
    let mut stats = vec![ColumnStats::default(); width];

    let probe = ParseContext::default();
    for row in &sampled {
        for (i, cell) in row.cells.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let col = &mut stats[i];
            if probe.resolve_date(cell).is_some() {
                col.date_count += 1;
            } else if looks_like_amount(cell) {
                col.amount_count += 1;
                match resolve_amount(cell) {
                    Some(v) if v < Decimal::ZERO => col.has_negative = true,
                    Some(v) if v > Decimal::ZERO => col.has_positive = true,
                    _ => {}
                }
            } else {
                col.text_count += 1;
            }
        }
    }

    let mut columns = ColumnMap {
        date: first_max(stats.iter().enumerate().filter(|(_, s)| s.date_count > 0).map(|(i, s)| (i, s.date_count))),
        ..ColumnMap::default()
    };

    // Both signs present means real transaction amounts; all-positive is usually a balance
    columns.amount = first_max(
        stats
            .iter()
            .enumerate()
            .filter(|(i, s)| s.amount_count > 0 && !columns.is_used(*i))
            .map(|(i, s)| (i, (s.has_negative && s.has_positive, s.has_negative, s.amount_count))),
    );

    columns.description = first_max(
        stats
            .iter()
            .enumerate()
            .filter(|(i, s)| s.text_count > 0 && !columns.is_used(*i))
            .map(|(i, s)| (i, s.text_count)),
    );

    columns
}

/// Index with the greatest key; ties go to the leftmost column
fn first_max<K: Ord>(candidates: impl Iterator<Item = (usize, K)>) -> Option<usize> {
    let mut best: Option<(usize, K)> = None;
    for (idx, key) in candidates {
        if best.as_ref().map_or(true, |(_, best_key)| key > *best_key) {
            best = Some((idx, key));
        }
    }
    best.map(|(idx, _)| idx)
}

fn parse_row(row: &Row, columns: &ColumnMap, ctx: &ParseContext) -> Result<ParsedTransaction> {
    let line = row.line;
    let (Some(date_col), Some(desc_col)) = (columns.date, columns.description) else {
        return Err(Error::row_skipped(line, "columns not resolved"));
    };

    let date_cell = row
        .cell(date_col)
        .ok_or_else(|| Error::row_skipped(line, "missing date"))?;
    let date = ctx
        .resolve_date(date_cell)
        .ok_or_else(|| Error::row_skipped(line, format!("unrecognized date '{}'", date_cell)))?;

    let description = row
        .cell(desc_col)
        .ok_or_else(|| Error::row_skipped(line, "missing description"))?;

    let amount = match columns.amount.and_then(|i| row.cell(i)) {
        Some(cell) => resolve_amount(cell),
        None => split_amount(row, columns),
    }
    .ok_or_else(|| Error::row_skipped(line, "missing or unreadable amount"))?;

    if amount.is_zero() {
        return Err(Error::row_skipped(line, "amount is zero"));
    }

    Ok(ParsedTransaction::new(date, description, amount).with_provenance(Provenance::Row {
        line,
        cells: row.cells.clone(),
    }))
}

/// Separate debit/credit columns: a non-zero debit is an outflow, else the credit is an inflow
fn split_amount(row: &Row, columns: &ColumnMap) -> Option<Decimal> {
    let debit = columns.debit.and_then(|i| row.cell(i)).and_then(resolve_amount);
    let credit = columns.credit.and_then(|i| row.cell(i)).and_then(resolve_amount);

    match (debit, credit) {
        (Some(d), _) if !d.is_zero() => Some(-d.abs()),
        (_, Some(c)) if !c.is_zero() => Some(c.abs()),
        (Some(d), _) => Some(d),
        (None, c) => c,
    }
}

fn describe(col: Option<usize>) -> String {
    col.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string())
}

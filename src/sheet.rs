//! Spreadsheet statements: a cell grid with a header row somewhere near the top.

use std::path::Path;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::dates::{excel_serial_to_date, find_date, DateNormalizer};
use crate::error::Result;
use crate::models::{
    truncate_particulars, NormalizedDate, Provenance, RecordKind, TransactionRecord,
};
use crate::names::extract_name;
use crate::recovery::latin1;
use crate::rows::{is_debit_text, leading_number};

const HEADER_SEARCH_ROWS: usize = 5;
const HEADER_HINTS: &[&str] = &[
    "date",
    "amount",
    "depositor",
    "customer",
    "transaction",
    "particulars",
];

const DATE_ALIASES: &[&str] = &["date", "transaction date", "trans date"];
const PARTICULARS_ALIASES: &[&str] =
    &["particulars", "description", "details", "narration", "reference"];
const DEPOSITOR_ALIASES: &[&str] =
    &["depositor", "customer", "name", "customer name", "from", "to"];
const AMOUNT_ALIASES: &[&str] = &["amount", "transaction amount", "credit", "debit"];
const DEPOSIT_ALIASES: &[&str] = &["deposits", "deposit", "credit", "cr", "credit amount"];
const WITHDRAWAL_ALIASES: &[&str] =
    &["withdrawals", "withdrawal", "debit", "dr", "debit amount"];
const BALANCE_ALIASES: &[&str] = &["balance", "closing balance", "running balance"];
const TYPE_ALIASES: &[&str] = &["type", "transaction type", "mode", "channel"];

static SERIAL_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{5})(?:\.\d+)?$").unwrap());
static SHORT_YEAR_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[-/](\d{1,2})[-/](\d{2})$").unwrap());

/// Resolved column positions for one grid.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ColumnMap {
    pub date: Option<usize>,
    pub particulars: Option<usize>,
    pub depositor: Option<usize>,
    pub amount: Option<usize>,
    pub deposits: Option<usize>,
    pub withdrawals: Option<usize>,
    pub balance: Option<usize>,
    pub kind: Option<usize>,
}

impl ColumnMap {
    pub fn from_headers(headers: &[String]) -> Self {
        Self {
            date: find_column(headers, DATE_ALIASES),
            particulars: find_column(headers, PARTICULARS_ALIASES),
            depositor: find_column(headers, DEPOSITOR_ALIASES),
            amount: find_column(headers, AMOUNT_ALIASES),
            deposits: find_column(headers, DEPOSIT_ALIASES),
            withdrawals: find_column(headers, WITHDRAWAL_ALIASES),
            balance: find_column(headers, BALANCE_ALIASES),
            kind: find_column(headers, TYPE_ALIASES),
        }
    }
}

/// First alias, in alias order, that appears as whole words in some header.
fn find_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    let padded: Vec<String> = headers.iter().map(|h| format!(" {} ", words(h))).collect();
    aliases.iter().find_map(|alias| {
        let needle = format!(" {alias} ");
        padded.iter().position(|h| h.contains(&needle))
    })
}

// "Dr/Withdrawal (INR)" -> "dr withdrawal inr"
fn words(header: &str) -> String {
    header
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Index of the header row among the first few rows.
pub fn find_header_row(grid: &[Vec<String>]) -> Option<usize> {
    grid.iter().take(HEADER_SEARCH_ROWS).position(|row| {
        let joined = row.concat().to_lowercase();
        HEADER_HINTS.iter().any(|hint| joined.contains(hint))
    })
}

/// Strip currency marks, grouping commas and whitespace; unreadable cells are zero.
pub fn cell_number(cell: &str) -> f64 {
    let cleaned: String = cell
        .chars()
        .filter(|c| !matches!(c, '₹' | '$' | ',') && !c.is_whitespace())
        .collect();
    leading_number(&cleaned).unwrap_or(0.0)
}

pub fn parse_grid(grid: &[Vec<String>], dates: &DateNormalizer) -> Vec<TransactionRecord> {
    let (headers, first_data_row): (Vec<String>, usize) = match find_header_row(grid) {
        Some(i) => (grid[i].iter().map(|h| h.trim().to_string()).collect(), i + 1),
        None => {
            let width = grid.first().map_or(0, Vec::len);
            ((0..width).map(|i| format!("column_{i}")).collect(), 0)
        }
    };
    let map = ColumnMap::from_headers(&headers);
    debug!(?map, first_data_row, "spreadsheet column map");

    let mut records = Vec::new();
    for (index, row) in grid.iter().enumerate().skip(first_data_row) {
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        match parse_sheet_row(row, index, &headers, &map, dates) {
            Some(record) => records.push(record),
            None => debug!(row = index + 1, "spreadsheet row has no amount"),
        }
    }
    info!(count = records.len(), "parsed spreadsheet rows");
    records
}

fn cell(row: &[String], col: Option<usize>) -> &str {
    col.and_then(|i| row.get(i)).map_or("", |c| c.trim())
}

fn parse_sheet_row(
    row: &[String],
    index: usize,
    headers: &[String],
    map: &ColumnMap,
    dates: &DateNormalizer,
) -> Option<TransactionRecord> {
    let value = |col: Option<usize>| cell(row, col);
    let number = |col: Option<usize>| cell_number(cell(row, col));

    let particulars_cell = value(map.particulars);
    let mut deposits = number(map.deposits).abs();
    let mut withdrawals = number(map.withdrawals).abs();
    if deposits == 0.0 && withdrawals == 0.0 && map.amount.is_some() {
        let amount = number(map.amount);
        if amount < 0.0 || is_debit_text(particulars_cell) {
            withdrawals = amount.abs();
        } else {
            deposits = amount;
        }
    }
    if deposits == 0.0 && withdrawals == 0.0 {
        return None;
    }

    let raw_date = match value(map.date) {
        "" => row.iter().find_map(|c| find_date(c)).unwrap_or(""),
        d => d,
    };
    let date = sheet_date(raw_date, dates);

    let particulars = if particulars_cell.is_empty() {
        format!("Transaction Row {}", index + 1)
    } else {
        truncate_particulars(particulars_cell)
    };
    let depositor = match value(map.depositor) {
        "" => extract_name(&particulars),
        name => name.to_string(),
    };
    let balance = map
        .balance
        .and_then(|i| row.get(i))
        .filter(|c| !c.trim().is_empty())
        .map(|c| cell_number(c));
    let kind = RecordKind::from_tag(value(map.kind))
        .unwrap_or_else(|| RecordKind::from_particulars(&particulars));

    Some(TransactionRecord {
        date: date.date,
        particulars,
        depositor,
        withdrawals,
        deposits,
        balance,
        kind,
        provenance: if date.defaulted {
            Provenance::DateDefaulted
        } else {
            Provenance::Parsed
        },
        source_columns: headers
            .iter()
            .zip(row)
            .filter(|(_, c)| !c.trim().is_empty())
            .map(|(h, c)| (h.clone(), c.trim().to_string()))
            .collect(),
    })
}

/// Spreadsheet date cells: a bare 5-digit Excel serial, or `DD/MM/YY` with the
/// century picked as 19xx above 50 and 20xx otherwise. Anything else goes to
/// the regular normalizer.
pub fn sheet_date(raw: &str, dates: &DateNormalizer) -> NormalizedDate {
    let raw = raw.trim();
    let parsed = if let Some(caps) = SERIAL_DATE.captures(raw) {
        caps[1].parse::<f64>().ok().and_then(excel_serial_to_date)
    } else if let Some(caps) = SHORT_YEAR_DATE.captures(raw) {
        short_year_date(&caps[1], &caps[2], &caps[3])
    } else {
        None
    };
    match parsed {
        Some(date) => NormalizedDate {
            date,
            defaulted: false,
        },
        None => dates.normalize(raw),
    }
}

fn short_year_date(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    let yy: i32 = year.parse().ok()?;
    let year = if yy > 50 { 1900 + yy } else { 2000 + yy };
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

/// Read a CSV export as a grid. Ragged rows are allowed, and fields that are
/// not UTF-8 are read as Latin-1.
pub fn load_csv(path: &Path) -> Result<Vec<Vec<String>>> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut grid = Vec::new();
    let mut latin1_rows = 0usize;
    for result in rdr.byte_records() {
        let record = result?;
        let mut row = Vec::with_capacity(record.len());
        let mut recoded = false;
        for field in record.iter() {
            match std::str::from_utf8(field) {
                Ok(text) => row.push(text.to_string()),
                Err(_) => {
                    recoded = true;
                    row.push(latin1(field));
                }
            }
        }
        if recoded {
            latin1_rows += 1;
        }
        grid.push(row);
    }
    if latin1_rows > 0 {
        warn!(rows = latin1_rows, "CSV rows were not UTF-8; read as Latin-1");
    }
    Ok(grid)
}

#[cfg(feature = "xlsx")]
const SHEET_HINTS: &[&str] = &["transaction", "statement", "data"];

/// Read the most statement-like sheet of a workbook. Date cells become ISO strings.
#[cfg(feature = "xlsx")]
pub fn load_workbook(path: &Path) -> Result<Vec<Vec<String>>> {
    use calamine::Reader;

    use crate::error::Error;

    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| Error::Spreadsheet(format!("Failed to open workbook: {e}")))?;
    let names = workbook.sheet_names();
    let sheet = names
        .iter()
        .find(|n| {
            let lower = n.to_lowercase();
            SHEET_HINTS.iter().any(|h| lower.contains(h))
        })
        .or_else(|| names.first())
        .cloned()
        .ok_or_else(|| Error::Spreadsheet("workbook has no sheets".into()))?;
    info!(sheet = %sheet, "reading worksheet");

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| Error::Spreadsheet(format!("Failed to read sheet {sheet}: {e}")))?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

#[cfg(feature = "xlsx")]
fn cell_text(cell: &calamine::Data) -> String {
    use calamine::Data;

    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

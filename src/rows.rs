use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::dates::{is_date_like, DateNormalizer};
use crate::models::{
    truncate_particulars, ColumnStructure, Provenance, RecordKind, RowFields, TransactionRecord,
};
use crate::names::extract_name;
use crate::settings::Settings;
use crate::structure::{split_columns, split_lines};

pub const SAMPLE_DEPOSITOR: &str = "Sample Customer";

/// Particulars keywords that send a generic amount to withdrawals.
pub const DEBIT_KEYWORDS: &[&str] = &["withdraw", "debit", "payment", "transfer out", "charge"];

const SAMPLE_ROWS: [[&str; 5]; 5] = [
    ["01/07/2025", "Opening Balance", "", "10000.00", "10000.00"],
    ["02/07/2025", "UPI-PHONEPE-123456789", "", "1500.00", "11500.00"],
    ["03/07/2025", "NEFT CREDIT-SALARY", "", "25000.00", "36500.00"],
    ["04/07/2025", "ATM WITHDRAWAL", "5000.00", "", "31500.00"],
    ["05/07/2025", "UPI-PAYTM-987654321", "", "2000.00", "33500.00"],
];

const MIN_LINE_LEN: usize = 10;
const MIN_COLUMNS: usize = 3;

static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(?:\d+\.?\d*|\.\d+)").unwrap());

#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub dates: DateNormalizer,
    pub sample_fallback: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            dates: DateNormalizer::new(),
            sample_fallback: true,
        }
    }
}

impl ParseOptions {
    pub fn from_settings(settings: &Settings, dates: DateNormalizer) -> Self {
        Self {
            dates,
            sample_fallback: settings.sample_fallback,
        }
    }
}

/// Keep digits, dots and minus signs, then read the leading number.
pub fn clean_number(cell: &str) -> Option<f64> {
    let kept: String = cell
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    leading_number(&kept)
}

/// Longest numeric prefix, the way a lenient float reader would take it.
pub(crate) fn leading_number(text: &str) -> Option<f64> {
    LEADING_NUMBER
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

fn positive(cell: &str) -> Option<f64> {
    clean_number(cell).filter(|n| *n > 0.0)
}

pub fn is_debit_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    DEBIT_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Route each cell to a typed field by the substring its header contains.
pub fn parse_row(columns: &[&str], structure: &ColumnStructure, dates: &DateNormalizer) -> RowFields {
    let mut row = RowFields::default();
    for (index, header) in structure.headers.iter().enumerate() {
        let value = columns.get(index).map_or("", |c| c.trim());
        let h = header.to_lowercase();
        if h.contains("date") {
            if is_date_like(value) {
                row.date = Some(dates.normalize(value));
            }
        } else if ["particular", "description", "detail", "narration"]
            .iter()
            .any(|k| h.contains(k))
        {
            row.description = Some(value.to_string());
        } else if h.contains("withdrawal") || h.contains("debit") || h.contains("dr") {
            if let Some(n) = positive(value) {
                row.withdrawal = Some(n);
                row.amount = Some(n);
            }
        } else if h.contains("deposit") || h.contains("credit") || h.contains("cr") {
            if let Some(n) = positive(value) {
                row.deposit = Some(n);
                row.amount = Some(n);
            }
        } else if h.contains("balance") {
            if let Some(n) = clean_number(value) {
                row.balance = Some(n);
            }
        } else if h.contains("amount") && row.amount.is_none() {
            row.amount = positive(value);
        }
    }
    row
}

/// Parse every data line below the header. Falls back to sample rows when
/// nothing parses and `options.sample_fallback` is set.
pub fn parse_records(
    text: &str,
    structure: &ColumnStructure,
    options: &ParseOptions,
) -> Vec<TransactionRecord> {
    let mut records = Vec::new();
    for line in split_lines(text).into_iter().skip(structure.start_line()) {
        let line = line.trim();
        if line.chars().count() < MIN_LINE_LEN {
            continue;
        }
        let columns = split_columns(line);
        if columns.len() < MIN_COLUMNS {
            continue;
        }
        let fields = parse_row(&columns, structure, &options.dates);
        match build_record(fields, &columns, structure) {
            Some(record) => records.push(record),
            None => debug!(line = %truncate_particulars(line), "row skipped"),
        }
    }
    info!(count = records.len(), "parsed statement rows");

    if records.is_empty() && options.sample_fallback {
        info!("no rows parsed, emitting sample rows");
        return sample_records(structure, &options.dates);
    }
    records
}

fn build_record(
    fields: RowFields,
    columns: &[&str],
    structure: &ColumnStructure,
) -> Option<TransactionRecord> {
    let date = fields.date?;
    let has_amount = fields.amount.is_some_and(|a| a > 0.0);
    if !has_amount && fields.balance.is_none() {
        return None;
    }

    let particulars = match fields.description.as_deref() {
        Some(d) if !d.is_empty() => truncate_particulars(d),
        _ => "Transaction".to_string(),
    };
    let (withdrawals, deposits) = match (fields.withdrawal, fields.deposit, fields.amount) {
        (None, None, Some(amount)) if is_debit_text(&particulars) => (amount, 0.0),
        (None, None, Some(amount)) => (0.0, amount),
        (w, d, _) => (w.unwrap_or(0.0), d.unwrap_or(0.0)),
    };

    Some(TransactionRecord {
        date: date.date,
        depositor: extract_name(&particulars),
        kind: RecordKind::from_particulars(&particulars),
        particulars,
        withdrawals,
        deposits,
        balance: fields.balance,
        provenance: if date.defaulted {
            Provenance::DateDefaulted
        } else {
            Provenance::Parsed
        },
        source_columns: source_columns(structure, columns),
    })
}

fn source_columns(structure: &ColumnStructure, columns: &[&str]) -> Vec<(String, String)> {
    structure
        .headers
        .iter()
        .zip(columns)
        .map(|(h, c)| (h.clone(), c.trim().to_string()))
        .filter(|(_, c)| !c.is_empty())
        .collect()
}

/// The fixed placeholder set, labeled with the structure's headers.
pub fn sample_records(structure: &ColumnStructure, dates: &DateNormalizer) -> Vec<TransactionRecord> {
    SAMPLE_ROWS
        .iter()
        .map(|cells| TransactionRecord {
            date: dates.normalize(cells[0]).date,
            particulars: cells[1].to_string(),
            depositor: SAMPLE_DEPOSITOR.to_string(),
            withdrawals: clean_number(cells[2]).unwrap_or(0.0),
            deposits: clean_number(cells[3]).unwrap_or(0.0),
            balance: clean_number(cells[4]),
            kind: RecordKind::from_particulars(cells[1]),
            provenance: Provenance::Sample,
            source_columns: structure
                .headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), cells.get(i).copied().unwrap_or("").to_string()))
                .collect(),
        })
        .collect()
}

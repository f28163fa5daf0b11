use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::dates::is_date_like;
use crate::models::{ColumnStructure, StructureSource};

/// Known statement header layouts, most common first.
pub const HEADER_TEMPLATES: &[&[&str]] = &[
    &["Date", "Particulars", "Withdrawals", "Deposits", "Balance"],
    &["Date", "Description", "Debit", "Credit", "Balance"],
    &["Transaction Date", "Details", "Amount", "Balance"],
    &["Date", "Narration", "Dr", "Cr", "Balance"],
    &["Date", "Transaction Details", "Withdrawal", "Deposit", "Running Balance"],
    &["Txn Date", "Description", "Dr/Withdrawal", "Cr/Deposit", "Balance"],
    &["Value Date", "Description", "Debit Amount", "Credit Amount", "Available Balance"],
];

pub const DEFAULT_HEADERS: &[&str] = &["Date", "Description", "Amount", "Balance"];

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\r]+").unwrap());
static COLUMN_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}|\t").unwrap());
static DATE_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)date|txn|value").unwrap());
static AMOUNT_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)amount|balance|debit|credit|withdrawal|deposit|dr|cr").unwrap()
});
static AMOUNT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}(?:,\d{3})*(?:\.\d{2})?").unwrap());
static AMOUNT_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{2})?$").unwrap());

/// How many lines each detection tier looks at.
#[derive(Debug, Clone, Copy)]
pub struct ScanDepth {
    pub header_lines: usize,
    pub inference_lines: usize,
}

impl Default for ScanDepth {
    fn default() -> Self {
        Self {
            header_lines: 50,
            inference_lines: 100,
        }
    }
}

pub fn split_lines(text: &str) -> Vec<&str> {
    LINE_BREAKS.split(text).collect()
}

/// Split a row on runs of two or more spaces, or a tab.
pub fn split_columns(line: &str) -> Vec<&str> {
    COLUMN_SPLIT.split(line).collect()
}

pub fn is_amount_cell(cell: &str) -> bool {
    AMOUNT_CELL.is_match(cell.trim())
}

pub fn detect_structure(text: &str) -> ColumnStructure {
    detect_structure_with(text, ScanDepth::default())
}

/// Exact template, then header-shaped line, then a data row; default layout last.
pub fn detect_structure_with(text: &str, depth: ScanDepth) -> ColumnStructure {
    let lines = split_lines(text);
    let structure = exact_header(&lines, depth.header_lines)
        .or_else(|| partial_header(&lines, depth.header_lines))
        .or_else(|| infer_from_data(&lines, depth.inference_lines))
        .unwrap_or_else(|| {
            ColumnStructure::new(
                DEFAULT_HEADERS.iter().map(|h| h.to_string()).collect(),
                None,
                StructureSource::Default,
            )
        });
    debug!(
        source = ?structure.source,
        header_line = ?structure.header_line,
        headers = ?structure.headers,
        "detected column structure"
    );
    structure
}

fn exact_header(lines: &[&str], limit: usize) -> Option<ColumnStructure> {
    for (i, line) in lines.iter().take(limit).enumerate() {
        let lower = line.trim().to_lowercase();
        for template in HEADER_TEMPLATES {
            if template.iter().all(|h| lower.contains(&h.to_lowercase())) {
                return Some(ColumnStructure::new(
                    template.iter().map(|h| h.to_string()).collect(),
                    Some(i),
                    StructureSource::ExactHeader,
                ));
            }
        }
    }
    None
}

fn partial_header(lines: &[&str], limit: usize) -> Option<ColumnStructure> {
    for (i, line) in lines.iter().take(limit).enumerate() {
        let columns = split_columns(line.trim());
        if columns.len() < 3 {
            continue;
        }
        let has_date = columns.iter().any(|c| DATE_HEADER.is_match(c));
        let has_amount = columns.iter().any(|c| AMOUNT_HEADER.is_match(c));
        if has_date && has_amount {
            return Some(ColumnStructure::new(
                columns.iter().map(|c| c.trim().to_string()).collect(),
                Some(i),
                StructureSource::PartialHeader,
            ));
        }
    }
    None
}

// Amount-shaped cells fill two slots in order of appearance: Amount, then Balance.
fn infer_from_data(lines: &[&str], limit: usize) -> Option<ColumnStructure> {
    for line in lines.iter().take(limit) {
        let line = line.trim();
        let columns = split_columns(line);
        if columns.len() < 3 || !is_date_like(line) || !AMOUNT_TOKEN.is_match(line) {
            continue;
        }
        let mut headers: Vec<String> = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            let label = if is_date_like(column) {
                "Date".to_string()
            } else if is_amount_cell(column) {
                if headers.iter().any(|h| h == "Amount") {
                    "Balance".to_string()
                } else {
                    "Amount".to_string()
                }
            } else if !headers.iter().any(|h| h == "Description") {
                "Description".to_string()
            } else {
                format!("Column {}", index + 1)
            };
            headers.push(label);
        }
        return Some(ColumnStructure::new(
            headers,
            None,
            StructureSource::DataInference,
        ));
    }
    None
}

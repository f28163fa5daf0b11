//! Line scan for statements whose text has no usable column layout.
//!
//! Any line mentioning a payment-system tag, or carrying a full date followed
//! by a number, becomes a candidate. Dates may come from neighbouring lines
//! because recovered PDF text often puts the date on its own line.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::dates::DateNormalizer;
use crate::models::{
    truncate_particulars, Provenance, RecordKind, TransactionRecord, UNKNOWN_CUSTOMER,
};
use crate::names::extract_name;

pub const TRIGGERS: &[&str] = &["MPAY", "UPI", "TRANSFER", "NEFT", "RTGS"];
pub const MAX_AMOUNT: f64 = 10_000_000.0;
const NEARBY_LINES: usize = 5;
const WINDOW_TOKENS: usize = 3;
const CREDIT_BLOCKERS: &[&str] = &["withdraw", "debit", "transfer out", "payment", "charge"];

static LINE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\r\x0C\t]+").unwrap());
static DATED_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{2}[-/]\d{2}[-/]\d{4}.*\d").unwrap());
static DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,2}[-/]\d{1,2}[-/]\d{2,4}").unwrap());
static AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}(?:,\d{3})+(?:\.\d{2})?|\d+(?:\.\d{2})?").unwrap());
static TOKEN_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static LEADING_SERIAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\s*").unwrap());

pub fn is_candidate(line: &str) -> bool {
    TRIGGERS.iter().any(|t| line.contains(t)) || DATED_AMOUNT.is_match(line)
}

/// Largest amount token strictly between zero and `MAX_AMOUNT`. Date tokens
/// are blanked first so their parts never count.
pub fn largest_amount(line: &str) -> Option<f64> {
    let without_dates = DATE.replace_all(line, " ");
    AMOUNT
        .find_iter(&without_dates)
        .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        .filter(|a| *a > 0.0 && *a < MAX_AMOUNT)
        .fold(None, |best: Option<f64>, a| Some(best.map_or(a, |b| b.max(a))))
}

pub fn scan_lines(text: &str, dates: &DateNormalizer) -> Vec<TransactionRecord> {
    let lines: Vec<&str> = LINE_SPLIT.split(text).map(str::trim).collect();
    let mut records = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        if line.is_empty() || !is_candidate(line) {
            continue;
        }
        match scan_line(&lines, index, dates) {
            Some(record) => records.push(record),
            None => debug!(line = %truncate_particulars(line), "no usable amount"),
        }
    }
    info!(count = records.len(), "keyword scan finished");
    records
}

fn scan_line(lines: &[&str], index: usize, dates: &DateNormalizer) -> Option<TransactionRecord> {
    let line = lines[index];
    let amount = largest_amount(line)?;

    let date = nearby_date(lines, index)
        .map(|raw| dates.normalize(raw))
        .unwrap_or_else(|| dates.fallback());

    let lower = line.to_lowercase();
    let is_deposit = !CREDIT_BLOCKERS.iter().any(|k| lower.contains(k));
    let particulars = truncate_particulars(LEADING_SERIAL.replace(line, "").trim());

    Some(TransactionRecord {
        date: date.date,
        depositor: extract_name(&particulars),
        kind: RecordKind::from_particulars(line),
        particulars,
        withdrawals: if is_deposit { 0.0 } else { amount },
        deposits: if is_deposit { amount } else { 0.0 },
        balance: None,
        provenance: if date.defaulted {
            Provenance::DateDefaulted
        } else {
            Provenance::Parsed
        },
        source_columns: Vec::new(),
    })
}

/// Last resort for text that lost its line structure: slide a three-token
/// window and take any window holding both a date and an amount. Every hit is
/// an untyped deposit from an unknown customer, and the window after a hit
/// starts past it.
pub fn scan_windows(text: &str, dates: &DateNormalizer) -> Vec<TransactionRecord> {
    let tokens: Vec<&str> = TOKEN_SPLIT.split(text).filter(|t| !t.is_empty()).collect();
    let mut records = Vec::new();
    let mut i = 0;
    while i + WINDOW_TOKENS <= tokens.len() {
        let window = tokens[i..i + WINDOW_TOKENS].join(" ");
        match window_record(&window, dates) {
            Some(record) => {
                records.push(record);
                i += WINDOW_TOKENS;
            }
            None => i += 1,
        }
    }
    info!(count = records.len(), "window scan finished");
    records
}

fn window_record(window: &str, dates: &DateNormalizer) -> Option<TransactionRecord> {
    let raw_date = DATE.find(window)?.as_str();
    let without_dates = DATE.replace_all(window, " ");
    let amount = AMOUNT
        .find_iter(&without_dates)
        .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        .find(|a| *a > 0.0 && *a < MAX_AMOUNT)?;
    let date = dates.normalize(raw_date);
    Some(TransactionRecord {
        date: date.date,
        particulars: truncate_particulars(window),
        depositor: UNKNOWN_CUSTOMER.to_string(),
        withdrawals: 0.0,
        deposits: amount,
        balance: None,
        kind: RecordKind::Other,
        provenance: if date.defaulted {
            Provenance::DateDefaulted
        } else {
            Provenance::Parsed
        },
        source_columns: Vec::new(),
    })
}

// The line's own date, else the first one within five lines either side.
fn nearby_date<'a>(lines: &[&'a str], index: usize) -> Option<&'a str> {
    if let Some(m) = DATE.find(lines[index]) {
        return Some(m.as_str());
    }
    let start = index.saturating_sub(NEARBY_LINES);
    let end = (index + NEARBY_LINES).min(lines.len().saturating_sub(1));
    lines[start..=end]
        .iter()
        .find_map(|l| DATE.find(l).map(|m| m.as_str()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn dates() -> DateNormalizer {
        DateNormalizer::with_today(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap())
    }

    #[test]
    fn test_trigger_line_with_date_on_previous_line() {
        let text = "02/07/2025\n1 MPAYUPITRTR509218316187GOVIND RAMSBINXXX94 15000.00\n";
        let records = scan_lines(text, &dates());
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2025, 7, 2).unwrap());
        assert_eq!(r.deposits, 15000.0);
        assert_eq!(r.depositor, "GOVIND RAM");
        assert_eq!(r.particulars, "MPAYUPITRTR509218316187GOVIND RAMSBINXXX94 15000.00");
        assert_eq!(r.kind, RecordKind::Upi);
        assert_eq!(r.provenance, Provenance::Parsed);
    }

    #[test]
    fn test_debit_wording_flips_direction() {
        let records = scan_lines("05/07/2025 UPI bill payment 1,250.00", &dates());
        assert_eq!(records[0].withdrawals, 1250.0);
        assert_eq!(records[0].deposits, 0.0);
    }

    #[test]
    fn test_missing_date_defaults() {
        let records = scan_lines("NEFT RAVI KUMAR 500.00", &dates());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].provenance, Provenance::DateDefaulted);
        assert_eq!(records[0].date, dates().today());
        assert_eq!(records[0].kind, RecordKind::Neft);
    }

    #[test]
    fn test_lines_without_triggers_or_amounts_are_dropped() {
        let text = "Opening statement\nUPI\n\tBranch: Main\n";
        assert!(scan_lines(text, &dates()).is_empty());
    }

    #[test]
    fn test_largest_amount_ignores_dates_and_references() {
        assert_eq!(
            largest_amount("02/07/2025 TRTR509218316187 500.00 2,100.50"),
            Some(2100.5)
        );
        assert_eq!(largest_amount("12/12/2024"), None);
        assert_eq!(largest_amount("99999999.00"), None);
    }

    #[test]
    fn test_window_scan_joins_split_tokens() {
        let text = "Opening\n02/07/2025\nGOVIND\n15,000.00\nclosing words here\n03/07/2025 x 250";
        let records = scan_windows(text, &dates());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2025, 7, 2).unwrap());
        assert_eq!(records[0].deposits, 15000.0);
        assert_eq!(records[0].particulars, "02/07/2025 GOVIND 15,000.00");
        assert_eq!(records[0].depositor, UNKNOWN_CUSTOMER);
        assert_eq!(records[0].kind, RecordKind::Other);
        assert_eq!(records[1].deposits, 250.0);
    }

    #[test]
    fn test_window_scan_needs_date_and_amount() {
        assert!(scan_windows("02/07/2025 alone here", &dates()).is_empty());
        assert!(scan_windows("amount 500 without date", &dates()).is_empty());
        assert!(scan_windows("too short", &dates()).is_empty());
    }

    #[test]
    fn test_candidate_detection() {
        assert!(is_candidate("RTGS/991"));
        assert!(is_candidate("01-07-2025 opening 100"));
        assert!(!is_candidate("1-7-2025 opening 100"));
        assert!(!is_candidate("upi lowercase"));
    }
}

//! Best-effort plaintext from statement bytes.
//!
//! There is no real PDF decoding here: compressed streams and font encodings
//! are out of reach. Uncompressed content streams still carry their shown
//! strings in the clear, and that is what the tiers below go after.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub const DOMAIN_KEYWORDS: &[&str] = &[
    "Date",
    "Transaction",
    "Balance",
    "Deposit",
    "Withdrawal",
    "Credit",
    "Debit",
];

const PDF_MAGIC: &[u8] = b"%PDF-";
const MIN_PRINTABLE_RATIO: f64 = 0.85;
/// TJ kerning at or below this (thousandths of an em) reads as a word gap.
const TJ_SPACE_THRESHOLD: f64 = -200.0;
const COLUMN_GAP: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryLimits {
    pub max_bytes: usize,
    pub min_run: usize,
    pub window_before: usize,
    pub window_after: usize,
}

impl Default for RecoveryLimits {
    fn default() -> Self {
        Self {
            max_bytes: 500_000,
            min_run: 3,
            window_before: 100,
            window_after: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryMethod {
    Direct,
    TextOperators,
    ReadableRuns,
    KeywordWindows,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredText {
    pub text: String,
    pub method: RecoveryMethod,
    /// Input was longer than `max_bytes` and only a prefix was scanned.
    pub truncated: bool,
}

/// Read a statement file and recover its text. Only I/O can fail.
pub fn recover_file(path: &Path, limits: &RecoveryLimits) -> Result<RecoveredText> {
    let bytes = std::fs::read(path).map_err(|source| Error::TextRecoveryFailed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(recover_text(&bytes, limits))
}

pub fn recover_text(bytes: &[u8], limits: &RecoveryLimits) -> RecoveredText {
    let truncated = bytes.len() > limits.max_bytes;
    let window = &bytes[..bytes.len().min(limits.max_bytes)];
    if truncated {
        info!(
            size = bytes.len(),
            scanned = window.len(),
            "large input, scanning prefix only"
        );
    }

    if !is_pdf(window) {
        let decoded = decode_plain(window);
        if printable_ratio(&decoded) >= MIN_PRINTABLE_RATIO {
            debug!(chars = decoded.len(), "input is plain text");
            return RecoveredText {
                text: clean(&decoded),
                method: RecoveryMethod::Direct,
                truncated,
            };
        }
    }

    let decoded = latin1(window);
    let shown = text_operators(&decoded);
    let (mut text, mut method) = if shown.trim().is_empty() {
        (
            readable_runs(&decoded, limits.min_run),
            RecoveryMethod::ReadableRuns,
        )
    } else {
        (shown, RecoveryMethod::TextOperators)
    };

    if !contains_domain_keyword(&text) {
        let windows = keyword_windows(window, limits);
        if !windows.is_empty() {
            debug!("no domain keywords recovered, appending keyword windows");
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&windows);
            method = RecoveryMethod::KeywordWindows;
        }
    }

    debug!(?method, chars = text.len(), "recovered text");
    RecoveredText {
        text: clean(&text),
        method,
        truncated,
    }
}

pub fn contains_domain_keyword(text: &str) -> bool {
    DOMAIN_KEYWORDS.iter().any(|k| text.contains(k))
}

/// `%PDF-` within the first kilobyte.
pub fn is_pdf(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

pub(crate) fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

// UTF-8 when it is UTF-8 (possibly cut mid-char by the size cap), Latin-1 otherwise.
fn decode_plain(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(e) if e.error_len().is_none() => {
            String::from_utf8_lossy(&bytes[..e.valid_up_to()]).into_owned()
        }
        Err(_) => latin1(bytes),
    }
}

fn printable_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut printable = 0usize;
    for c in text.chars() {
        total += 1;
        if !c.is_control() || matches!(c, '\n' | '\r' | '\t') {
            printable += 1;
        }
    }
    if total == 0 {
        return 1.0;
    }
    printable as f64 / total as f64
}

static TEXT_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\bBT\b(.*?)\bET\b").unwrap());
static TEXT_OP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?s)\((?P<lit>(?:\\.|[^\\)])*)\)\s*(?P<show>Tj|')",
        r"|\[(?P<arr>(?:\\.|[^\\\]])*)\]\s*TJ",
        r"|(?P<tx>-?\d*\.?\d+)\s+(?P<ty>-?\d*\.?\d+)\s+T[dD]\b",
        r"|(?P<nl>T\*)",
    ))
    .unwrap()
});
static ARRAY_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\((?P<lit>(?:\\.|[^\\)])*)\)|(?P<kern>-?\d*\.?\d+)").unwrap());

/// Shown strings from `Tj`, `'` and `TJ`, laid out by the `Td`/`T*` moves
/// between them: horizontal moves become column gaps, vertical moves and
/// block ends become line breaks.
fn text_operators(decoded: &str) -> String {
    let mut blocks: Vec<&str> = TEXT_BLOCK
        .captures_iter(decoded)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    if blocks.is_empty() {
        blocks.push(decoded);
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut pending_gap = false;

    for block in blocks {
        for caps in TEXT_OP.captures_iter(block) {
            let shown = if let Some(lit) = caps.name("lit") {
                if caps.name("show").is_some_and(|m| m.as_str() == "'") {
                    flush_line(&mut current, &mut lines);
                }
                decode_literal(lit.as_str())
            } else if let Some(arr) = caps.name("arr") {
                decode_array(arr.as_str())
            } else if caps.name("nl").is_some() {
                flush_line(&mut current, &mut lines);
                pending_gap = false;
                continue;
            } else {
                let ty: f64 = caps
                    .name("ty")
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or(0.0);
                let tx: f64 = caps
                    .name("tx")
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or(0.0);
                if ty != 0.0 {
                    flush_line(&mut current, &mut lines);
                    pending_gap = false;
                } else if tx != 0.0 {
                    pending_gap = true;
                }
                continue;
            };
            if shown.is_empty() {
                continue;
            }
            if pending_gap && !current.is_empty() {
                current.push_str(COLUMN_GAP);
            }
            pending_gap = false;
            current.push_str(&shown);
        }
        flush_line(&mut current, &mut lines);
        pending_gap = false;
    }
    lines.join("\n")
}

fn flush_line(current: &mut String, lines: &mut Vec<String>) {
    if !current.trim().is_empty() {
        lines.push(std::mem::take(current));
    }
    current.clear();
}

fn decode_array(body: &str) -> String {
    let mut out = String::new();
    for item in ARRAY_ITEM.captures_iter(body) {
        if let Some(lit) = item.name("lit") {
            out.push_str(&decode_literal(lit.as_str()));
        } else if let Some(kern) = item.name("kern") {
            let k: f64 = kern.as_str().parse().unwrap_or(0.0);
            if k <= TJ_SPACE_THRESHOLD && !out.ends_with(' ') {
                out.push(' ');
            }
        }
    }
    out
}

/// Decode PDF literal-string escapes.
fn decode_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else { break };
        match next {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' | 'f' => {}
            '\n' | '\r' => {}
            '0'..='7' => {
                let mut value = next.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                if let Some(ch) = char::from_u32(value & 0xFF) {
                    out.push(ch);
                }
            }
            other => out.push(other),
        }
    }
    out
}

static READABLE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9\s/\-.,:]+").unwrap());

fn readable_runs(decoded: &str, min_run: usize) -> String {
    READABLE_RUN
        .find_iter(decoded)
        .map(|m| m.as_str())
        .filter(|run| run.len() > min_run && run.chars().any(|c| c.is_ascii_alphabetic()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A fixed window of raw bytes around the first hit of each domain keyword.
fn keyword_windows(bytes: &[u8], limits: &RecoveryLimits) -> String {
    let mut windows = Vec::new();
    for keyword in DOMAIN_KEYWORDS {
        let needle = keyword.as_bytes();
        let Some(pos) = bytes.windows(needle.len()).position(|w| w == needle) else {
            continue;
        };
        let start = pos.saturating_sub(limits.window_before);
        let end = (pos + limits.window_after).min(bytes.len());
        windows.push(latin1(&bytes[start..end]));
    }
    windows.join("\n")
}

// Control chars other than line breaks and tabs become spaces.
fn clean(text: &str) -> String {
    let mapped: String = text
        .replace("\r\n", "\n")
        .chars()
        .map(|c| match c {
            '\n' | '\t' => c,
            '\r' => '\n',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();
    mapped
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(content: &str) -> Vec<u8> {
        let mut bytes = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n1 0 obj\n<< /Length 99 >>\nstream\n".to_vec();
        bytes.extend_from_slice(content.as_bytes());
        bytes.extend_from_slice(b"\nendstream\nendobj\n\x00\x01\x02\x8f\xff");
        bytes
    }

    #[test]
    fn test_plain_text_is_direct() {
        let text = "Date  Particulars  Deposits  Balance\r\n02/07/2025  UPI  100.00  200.00\n";
        let out = recover_text(text.as_bytes(), &RecoveryLimits::default());
        assert_eq!(out.method, RecoveryMethod::Direct);
        assert!(!out.truncated);
        assert_eq!(
            out.text.lines().collect::<Vec<_>>(),
            vec![
                "Date  Particulars  Deposits  Balance",
                "02/07/2025  UPI  100.00  200.00"
            ]
        );
    }

    #[test]
    fn test_tj_operators_laid_out_as_rows() {
        let content = "BT\n/F1 10 Tf\n72 700 Td\n(Date) Tj\n100 0 Td\n(Particulars) Tj\n100 0 Td\n(Deposits) Tj\n\
                       0 -14 Td\n(02/07/2025) Tj\n100 0 Td\n(MPAYUPITRTR509218316187GOVIND RAMSBINXXX94) Tj\n\
                       100 0 Td\n(15000.00) Tj\nET";
        let out = recover_text(&pdf(content), &RecoveryLimits::default());
        assert_eq!(out.method, RecoveryMethod::TextOperators);
        let lines: Vec<_> = out.text.lines().collect();
        assert_eq!(lines[0], "Date  Particulars  Deposits");
        assert_eq!(
            lines[1],
            "02/07/2025  MPAYUPITRTR509218316187GOVIND RAMSBINXXX94  15000.00"
        );
    }

    #[test]
    fn test_tj_array_kerning_and_escapes() {
        let content = "BT [(GOV)-250(IND)] TJ T* [(15)10(000.00)] TJ T* (A\\(B\\)C\\\\D\\101) Tj ET";
        let out = recover_text(&pdf(content), &RecoveryLimits::default());
        let lines: Vec<_> = out.text.lines().collect();
        assert_eq!(lines, vec!["GOV IND", "15000.00", "A(B)C\\DA"]);
    }

    #[test]
    fn test_readable_runs_without_operators() {
        let mut bytes = b"%PDF-1.5\n\x00\x01\x02".to_vec();
        bytes.extend_from_slice(b"Balance carried forward 1200.50\x00\x9f\xff junk");
        let out = recover_text(&bytes, &RecoveryLimits::default());
        assert_eq!(out.method, RecoveryMethod::ReadableRuns);
        assert!(out.text.contains("Balance carried forward 1200.50"));
    }

    #[test]
    fn test_keyword_windows_when_operators_miss_keywords() {
        let mut bytes = pdf("BT (Hello) Tj ET");
        bytes.extend_from_slice(b"<< /Title (Credit note 4411) >>");
        let out = recover_text(&bytes, &RecoveryLimits::default());
        assert_eq!(out.method, RecoveryMethod::KeywordWindows);
        assert!(out.text.starts_with("Hello"));
        assert!(out.text.contains("Credit note 4411"));
    }

    #[test]
    fn test_binary_garbage_never_panics() {
        let bytes: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 256) as u8).collect();
        let out = recover_text(&bytes, &RecoveryLimits::default());
        assert!(!out.text.contains('\0'));
        let empty = recover_text(&[], &RecoveryLimits::default());
        assert_eq!(empty.text, "");
    }

    #[test]
    fn test_input_is_capped() {
        let limits = RecoveryLimits {
            max_bytes: 16,
            ..RecoveryLimits::default()
        };
        let out = recover_text(b"Date Particulars Balance and much more", &limits);
        assert!(out.truncated);
        assert_eq!(out.text, "Date Particulars");
    }

    #[test]
    fn test_recover_file_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = recover_file(&dir.path().join("missing.pdf"), &RecoveryLimits::default())
            .unwrap_err();
        assert!(matches!(err, Error::TextRecoveryFailed { .. }));
    }

    #[test]
    fn test_recover_file_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stmt.txt");
        std::fs::write(&path, "Date Particulars Balance\n").unwrap();
        let out = recover_file(&path, &RecoveryLimits::default()).unwrap();
        assert_eq!(out.text, "Date Particulars Balance");
    }
}
